//! Writing rendered pages to files or standard output, and linking the
//! names of grouped pages to the single file holding them.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use c2man_core::{LinkPolicy, ManualPage, ObjectKind, Options, Session};
use tracing::{debug, info};

use crate::error::{RenderError, Result};
use crate::output::{Output, driver_for};
use crate::page::{RenderContext, output_manpage};

/// Files touched by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub generated: Vec<PathBuf>,
    /// Links or stubs created for the other names of a grouped page.
    pub linked: Vec<PathBuf>,
    /// Stale files removed under [`LinkPolicy::Remove`].
    pub removed: Vec<PathBuf>,
}

/// Extension, and manual section, of pages of `kind`.
pub fn page_section(options: &Options, kind: ObjectKind) -> &str {
    options
        .objects
        .get(kind)
        .extension
        .as_deref()
        .unwrap_or_else(|| options.section())
}

/// Path of the page for `based_on`: `[output_dir/][subdir/]based_on.extension`.
pub fn page_file_name(
    options: &Options,
    based_on: &str,
    kind: ObjectKind,
    extension: &str,
) -> PathBuf {
    let mut path = options.output_dir.clone().unwrap_or_default();
    if let Some(subdir) = &options.objects.get(kind).subdir {
        path.push(subdir);
    }
    path.push(format!("{based_on}.{extension}"));
    path
}

/// Deletes `path` if it exists.
fn remove_old_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed old file");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(RenderError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

/// Renders every page of `session`.
pub fn render_session(session: &mut Session, stdout: &mut dyn Write) -> Result<RenderSummary> {
    let ctx = RenderContext {
        options: &session.options,
        enums: &session.enums,
        input_files: session.input_files,
        group_terse: session.group_terse.as_deref(),
    };
    render_pages(&ctx, session.pages.pages_mut(), stdout)
}

/// Renders `pages` into files, or onto `stdout` when the output directory
/// is `-`.
///
/// With grouping, everything goes into the first page's file, named after
/// the input file when asked to, and the other names are linked to it
/// according to the link policy.
pub fn render_pages(
    ctx: &RenderContext<'_>,
    pages: &mut [ManualPage],
    stdout: &mut dyn Write,
) -> Result<RenderSummary> {
    let options = ctx.options;
    let to_stdout = options.to_stdout();
    let group = options.group_together;
    let mut out = driver_for(options)?;
    let mut summary = RenderSummary::default();
    let mut filename = None;

    for index in 0..pages.len() {
        let page = &pages[index];
        let kind = page.object_kind();
        let section = page_section(options, kind).to_string();
        let input_base = page.source_base().map(str::to_string);
        let name = page.name().to_string();

        let path = if to_stdout {
            None
        } else {
            let based_on = match &input_base {
                Some(base) if options.use_input_name => base.as_str(),
                _ => name.as_str(),
            };
            let path = page_file_name(options, based_on, kind, &section);
            eprintln!("generating: {}", path.display());
            info!(path = %path.display(), "generating page");
            remove_old_file(&path)?;
            Some(path)
        };

        let title = match &input_base {
            Some(base) if group => base.as_str(),
            _ => name.as_str(),
        };
        let header_section = if group {
            options.section().to_string()
        } else {
            section
        };
        output_manpage(out.as_mut(), ctx, pages, index, Some(title), &header_section);

        if to_stdout && !group && index + 1 < pages.len() {
            out.character('\x0c');
        }
        let text = out.take_output();
        match &path {
            Some(path) => {
                write_file(path, &text)?;
                summary.generated.push(path.clone());
            }
            None => stdout.write_all(text.as_bytes())?,
        }
        filename = path;

        if group {
            break;
        }
    }
    if to_stdout {
        stdout.flush()?;
    }

    if let Some(filename) = filename
        && group
        && options.link_policy != LinkPolicy::None
    {
        link_pages(out.as_mut(), options, pages, &filename, &mut summary)?;
    }
    Ok(summary)
}

fn link_pages(
    out: &mut dyn Output,
    options: &Options,
    pages: &[ManualPage],
    filename: &Path,
    summary: &mut RenderSummary,
) -> Result<()> {
    let policy = options.link_policy;
    let skip = match pages.first() {
        Some(first) if options.use_input_name && first.sourcefile.is_some() => 0,
        _ => 1,
    };

    for page in pages.iter().skip(skip) {
        let kind = page.object_kind();
        let link = page_file_name(options, page.name(), kind, page_section(options, kind));
        if link == filename {
            continue;
        }

        let verb = if policy == LinkPolicy::Remove {
            "removing"
        } else {
            "linking"
        };
        eprintln!("{verb}: {}", link.display());
        info!(link = %link.display(), target = %filename.display(), ?policy, "{verb} page");

        remove_old_file(&link)?;
        let link_err = |source| RenderError::Link {
            link: link.clone(),
            target: filename.to_path_buf(),
            source,
        };
        match policy {
            LinkPolicy::Hard => fs::hard_link(filename, &link).map_err(link_err)?,
            LinkPolicy::Soft => symlink(&symlink_target(filename, &link), &link).map_err(link_err)?,
            LinkPolicy::File => {
                out.warning();
                out.include(&filename.to_string_lossy());
                let stub = out.take_output();
                fs::write(&link, stub).map_err(link_err)?;
            }
            LinkPolicy::None => {}
            LinkPolicy::Remove => {
                summary.removed.push(link);
                continue;
            }
        }
        summary.linked.push(link);
    }
    Ok(())
}

/// Target for a symbolic link at `link`: the bare file name when both sit
/// in the same directory, so the link survives moving the directory.
fn symlink_target(target: &Path, link: &Path) -> PathBuf {
    match (target.parent(), link.parent(), target.file_name()) {
        (Some(a), Some(b), Some(name)) if a == b => PathBuf::from(name),
        _ => target.to_path_buf(),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
