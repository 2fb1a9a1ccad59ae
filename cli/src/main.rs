use std::io::{self, Read};
use std::path::PathBuf;

use c2man_core::{LinkPolicy, Options, OutputFormat, PrototypeFormat, Session};
use c2man_parser::{decode_source, parse_file, parse_source};
use c2man_render::{Settings, render_session};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter.
const LOG_ENV: &str = "C2MAN_LOG";

#[derive(Debug, Parser)]
#[command(name = "c2man")]
#[command(about = "Generate manual pages from C declarations and their comments")]
#[command(disable_version_flag = true)]
struct Cli {
    /// C source or header files; standard input when none are given.
    files: Vec<PathBuf>,

    /// Output directory; `-` writes every page to standard output.
    #[arg(short = 'o', value_name = "DIR", allow_hyphen_values = true)]
    output_dir: Option<PathBuf>,

    /// Document static declarations.
    #[arg(short = 's')]
    statics: bool,

    /// Document variables as well as functions.
    #[arg(short = 'v')]
    variables: bool,

    /// Do not promote char, short and float K&R parameters.
    #[arg(short = 'p')]
    no_promote: bool,

    /// Do not capitalize sentences or add full stops.
    #[arg(short = 'k')]
    keep_comments: bool,

    /// Also use the comment at the start of a function body.
    #[arg(short = 'b')]
    body_start: bool,

    /// Use only the comment at the start of a function body.
    #[arg(short = 'B')]
    body_start_only: bool,

    /// Add `#include <FILE>` to every SYNOPSIS.
    #[arg(short = 'i', value_name = "FILE")]
    includes: Vec<String>,

    /// Directory prefix for the header in SYNOPSIS.
    #[arg(short = 'H', value_name = "PREFIX")]
    header_prefix: Option<String>,

    /// Put all pages into one.
    #[arg(short = 'g')]
    group: bool,

    /// Put all pages into one, described by TERSE.
    #[arg(short = 'G', value_name = "TERSE")]
    group_terse: Option<String>,

    /// Leave out document preamble and trailer.
    #[arg(short = 'e')]
    embeddable: bool,

    /// How grouped pages are linked: h(ard), s(oft), f(ile), n(one) or r(emove).
    #[arg(short = 'l', value_name = "TYPE", value_parser = parse_link_policy)]
    link: Option<LinkPolicy>,

    /// Name grouped output after the input file.
    #[arg(short = 'n')]
    use_input_name: bool,

    /// Only list parameters that have a comment.
    #[arg(short = 'L')]
    lazy: bool,

    /// Output format n(roff), l(atex), h(tml), t(exinfo) or a(utodoc), with
    /// comma-separated driver options, e.g. `t,s2,C`.
    #[arg(short = 'T', value_name = "FORMAT[,OPTS]", value_parser = parse_format)]
    format: Option<FormatSelection>,

    /// Manual name for the page header.
    #[arg(short = 'M', value_name = "NAME")]
    manual_name: Option<String>,

    /// Manual section, also used as the file extension.
    #[arg(short = 'S', value_name = "SECTION")]
    section: Option<String>,

    /// Leave out a section; may be repeated.
    #[arg(short = 'x', value_name = "SECTION")]
    exclude: Vec<String>,

    /// Per-category output: f, v, F or V followed by [subdir][.ext].
    #[arg(short = 'O', value_name = "SPEC")]
    objects: Vec<String>,

    /// Prototype layout given as an example, e.g. "int f(a, b)".
    #[arg(short = 'F', value_name = "TEMPLATE")]
    prototype: Option<String>,

    /// Print the version and report progress.
    #[arg(short = 'V')]
    verbose: bool,

    /// YAML file with default options; flags override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the parsed declarations as JSON instead of rendering them.
    #[arg(long)]
    dump_ir: bool,
}

#[derive(Debug, Clone)]
struct FormatSelection {
    format: OutputFormat,
    options: Vec<String>,
}

fn single_flag(value: &str) -> Option<char> {
    let mut chars = value.chars();
    chars.next().filter(|_| chars.next().is_none())
}

fn parse_link_policy(value: &str) -> Result<LinkPolicy, String> {
    single_flag(value)
        .and_then(LinkPolicy::from_flag)
        .ok_or_else(|| format!("unknown link type '{value}', expected one of h, s, f, n, r"))
}

fn parse_format(value: &str) -> Result<FormatSelection, String> {
    let (selector, rest) = value.split_once(',').unwrap_or((value, ""));
    let format = single_flag(selector)
        .and_then(OutputFormat::from_flag)
        .ok_or_else(|| format!("unknown output format '{selector}', expected one of n, l, h, t, a"))?;
    let options = rest
        .split(',')
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    Ok(FormatSelection { format, options })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Builds the run's options from the configuration file, if any, and the
/// command-line flags.
fn build_options(cli: &Cli) -> Result<Options, String> {
    let mut options = match &cli.config {
        Some(path) => Options::load(path)
            .map_err(|err| format!("cannot load config '{}': {err}", path.display()))?,
        None => Options::default(),
    };

    if let Some(dir) = &cli.output_dir {
        options.output_dir = Some(dir.clone());
    }
    options.static_out |= cli.statics;
    options.variables_out |= cli.variables;
    if cli.no_promote {
        options.promote_params = false;
    }
    if cli.keep_comments {
        options.fixup_comments = false;
    }
    options.look_at_body_start |= cli.body_start || cli.body_start_only;
    options.body_start_only |= cli.body_start_only;
    options.includes.extend(cli.includes.iter().cloned());
    if let Some(prefix) = &cli.header_prefix {
        options.header_prefix = Some(prefix.clone());
    }
    if let Some(terse) = &cli.group_terse {
        options.group_terse = Some(terse.clone());
    }
    options.group_together |= cli.group || cli.group_terse.is_some();
    options.embeddable |= cli.embeddable;
    if let Some(link) = cli.link {
        options.link_policy = link;
    }
    options.use_input_name |= cli.use_input_name;
    if cli.lazy {
        options.always_document_params = false;
    }
    if let Some(selection) = &cli.format {
        options.format = selection.format;
        options.format_options = selection.options.clone();
    }
    if let Some(name) = &cli.manual_name {
        options.manual_name = Some(name.clone());
    }
    if let Some(section) = &cli.section {
        options.manual_section = Some(section.clone());
    }
    options.excluded_sections.extend(cli.exclude.iter().cloned());
    for spec in &cli.objects {
        options
            .objects
            .apply_flag_spec(spec)
            .map_err(|err| format!("-O {spec}: {err}"))?;
    }
    if let Some(template) = &cli.prototype {
        options.prototype = PrototypeFormat::parse(template).map_err(|err| err.to_string())?;
    }
    options.verbose |= cli.verbose;

    Ok(options)
}

fn run(cli: Cli) -> Result<(), String> {
    let options = build_options(&cli)?;
    if options.verbose {
        eprintln!("c2man: Version {PACKAGE_VERSION}");
    }
    if cli.files.is_empty() && options.use_input_name {
        return Err("cannot name output after input file if there isn't one".to_string());
    }
    debug!(?options, "options");

    // Fail on bad driver options before any parsing.
    if let Err(err) = c2man_render::driver_for(&options) {
        let usage = c2man_render::driver(options.format, Settings::from_options(&options))
            .print_options();
        return Err(if usage.is_empty() {
            err.to_string()
        } else {
            format!("{err}\n{usage}")
        });
    }

    let mut session = Session::new(options);
    if cli.files.is_empty() {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .map_err(|err| format!("cannot read standard input: {err}"))?;
        session.begin_file(None, None);
        parse_source(&mut session, &decode_source(bytes)).map_err(|err| err.to_string())?;
        report_diagnostics(&session, 0);
    } else {
        let mut reported = 0;
        for file in &cli.files {
            parse_file(&mut session, file).map_err(|err| err.to_string())?;
            reported = report_diagnostics(&session, reported);
            if session.error_count() > 0 {
                break;
            }
        }
    }

    let errors = session.error_count();
    if errors > 0 {
        return Err(format!(
            "{errors} error{} found, no pages written",
            if errors == 1 { "" } else { "s" }
        ));
    }

    if cli.dump_ir {
        let ir = serde_json::json!({
            "pages": session.pages,
            "enums": session.enums,
        });
        let text = serde_json::to_string_pretty(&ir)
            .map_err(|err| format!("failed to serialize declarations: {err}"))?;
        println!("{text}");
        return Ok(());
    }

    if session.pages.is_empty() {
        info!("no documented declarations");
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    let summary = render_session(&mut session, &mut stdout).map_err(|err| err.to_string())?;
    info!(
        generated = summary.generated.len(),
        linked = summary.linked.len(),
        removed = summary.removed.len(),
        "done"
    );
    session.teardown();
    Ok(())
}

/// Prints the diagnostics recorded since the last call; returns how many
/// have been printed in total.
fn report_diagnostics(session: &Session, already: usize) -> usize {
    let diagnostics = session.diagnostics();
    for diagnostic in &diagnostics[already..] {
        eprintln!("{diagnostic}");
    }
    diagnostics.len()
}
