use std::path::{Path, PathBuf};

use c2man_core::{LinkPolicy, Options, OutputFormat, Session};
use c2man_parser::parse_file;
use c2man_render::render_session;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse(options: Options, name: &str) -> Session {
    let mut session = Session::new(options);
    parse_file(&mut session, &fixture(name)).expect("fixture file must be readable");
    assert_eq!(
        session.error_count(),
        0,
        "unexpected diagnostics: {:?}",
        session.diagnostics()
    );
    session
}

fn to_stdout(format: OutputFormat) -> Options {
    Options {
        format,
        output_dir: Some(PathBuf::from("-")),
        ..Options::default()
    }
}

fn render(options: Options, name: &str) -> String {
    let mut session = parse(options, name);
    let mut stdout = Vec::new();
    render_session(&mut session, &mut stdout).expect("rendering to memory");
    String::from_utf8(stdout).expect("pages are UTF-8")
}

#[test]
fn test_every_format_renders_a_function() {
    let expectations = [
        (OutputFormat::Nroff, ".SH \"RETURNS\""),
        (OutputFormat::Latex, "\\section*{RETURNS}"),
        (OutputFormat::Html, "<h1>RETURNS</h1>"),
        (OutputFormat::Texinfo, "@heading RETURNS"),
        (OutputFormat::Autodoc, "    RESULT\n"),
    ];
    for (format, returns_heading) in expectations {
        let page = render(to_stdout(format), "math.h");
        assert!(page.contains("adds two numbers"), "{format:?}: {page}");
        assert!(page.contains("Adds two numbers."), "{format:?}: {page}");
        assert!(page.contains("The sum."), "{format:?}: {page}");
        assert!(page.contains("First term."), "{format:?}: {page}");
        assert!(page.contains(returns_heading), "{format:?}: {page}");
    }
}

#[test]
fn test_nroff_page_layout() {
    let page = render(to_stdout(OutputFormat::Nroff), "math.h");

    assert!(page.contains(".TH \"add\" 3 \""));
    assert!(page.contains("\"c2man math.h\"\n"));
    assert!(page.contains(".SH \"NAME\"\nadd \\- adds two numbers.\n"));
    assert!(page.contains("#include <math.h>\n"));
    assert!(page.contains("int add\n.br\n(\n.br\n\tint a,\n.br\n\tint b\n.br\n);\n"));
    assert!(page.contains(".TP\n.B \"int a\"\nFirst term.\n"));

    let order: Vec<_> = ["NAME", "SYNOPSIS", "PARAMETERS", "DESCRIPTION", "RETURNS"]
        .iter()
        .map(|s| page.find(&format!(".SH \"{s}\"")).expect(s))
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_excluded_sections_are_left_out() {
    let options = Options {
        excluded_sections: vec!["SYNOPSIS".to_string(), "RETURNS".to_string()],
        ..to_stdout(OutputFormat::Nroff)
    };
    let page = render(options, "math.h");
    assert!(!page.contains("SYNOPSIS"));
    assert!(!page.contains("RETURNS"));
    assert!(page.contains(".SH \"DESCRIPTION\""));
}

#[test]
fn test_separate_pages_reference_each_other() {
    let page = render(to_stdout(OutputFormat::Nroff), "device.h");
    let pages: Vec<_> = page.split('\x0c').collect();
    assert_eq!(pages.len(), 3);
    assert!(pages[0].contains(".SH \"SEE ALSO\"\ndev_close(3),\ndev_poll(3)\n"));
    assert!(pages[2].contains("Possible values for a \\fBdev_state\\fR are as follows:\n"));
    assert!(pages[2].contains("\\fBDEV_IDLE\\fR\nNothing queued.\n"));
    assert!(pages[2].contains(".SH \"NOTES\"\nNever blocks.\n"));
}

#[test]
fn test_grouped_page_merges_parameters() {
    let options = Options {
        group_together: true,
        group_terse: Some("device control".to_string()),
        ..to_stdout(OutputFormat::Nroff)
    };
    let page = render(options, "device.h");

    assert_eq!(page.matches('\x0c').count(), 0);
    assert!(page.contains(".TH \"device\" 3"));
    assert!(page.contains("dev_open,\ndev_close,\ndev_poll \\- device control\n"));
    assert_eq!(page.matches("Descriptor.").count(), 1);
    assert!(page.contains("(dev_open)"));
    assert!(page.contains("(dev_poll)"));
    assert!(page.contains(".SS \"dev_close\"\nCloses the device.\n"));
    assert!(page.contains(".SH \"NOTES\"\n.SS \"dev_poll\"\nNever blocks.\n"));
    assert!(!page.contains("SEE ALSO"));
}

#[test]
fn test_grouped_files_on_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let options = Options {
        group_together: true,
        use_input_name: true,
        link_policy: LinkPolicy::File,
        format: OutputFormat::Html,
        output_dir: Some(dir.path().to_path_buf()),
        ..Options::default()
    };
    let mut session = parse(options, "device.h");
    let mut stdout = Vec::new();
    let summary = render_session(&mut session, &mut stdout).unwrap();

    let main: &Path = &dir.path().join("device.html");
    assert_eq!(summary.generated, vec![main.to_path_buf()]);
    assert_eq!(summary.linked.len(), 3);
    assert!(stdout.is_empty());

    let stub = std::fs::read_to_string(dir.path().join("dev_poll.html")).unwrap();
    assert!(stub.contains("<!--#include virtual="));
    assert!(stub.contains("device.html"));
}
