//! C declaration parser for c2man.
//!
//! The parser turns C source text into calls on the semantic actions of a
//! [`Session`](c2man_core::Session): comments are attached to the
//! declarations, parameters and enumerators they describe, and every
//! top-level declaration is offered to the page registry.
//!
//! ```
//! use c2man_core::{Options, Session};
//!
//! let mut session = Session::new(Options::default());
//! session.begin_file(Some("math.h"), None);
//! c2man_parser::parse_source(&mut session, "/* Adds. */\nint add(int a, int b);").unwrap();
//!
//! assert_eq!(session.pages.pages()[0].name(), "add");
//! ```

mod comment;
mod error;
mod grammar;
mod lexer;

use std::fs;
use std::path::Path;

use c2man_core::Session;
use tracing::{debug, info};

pub use comment::{clean_block_comment, clean_line_comments};
pub use error::{ParseError, Result};
pub use lexer::{Lexed, Token, TokenKind, tokenize};

/// Parses source text belonging to the session's current base file.
///
/// Call [`Session::begin_file`] first. Syntax and semantic errors are
/// recorded on the session; only lexical errors are returned.
pub fn parse_source(session: &mut Session, source: &str) -> Result<()> {
    let basefile = session.source.basefile.clone();
    let lexed = tokenize(source, basefile.as_deref())?;
    debug!(tokens = lexed.tokens.len(), "tokenized");

    if session.options.group_together
        && let Some(first) = &lexed.first_comment
    {
        session.remember_terse(first);
    }

    grammar::Grammar::new(session, lexed.tokens).translation_unit();
    Ok(())
}

/// Decodes source bytes as UTF-8, or as Latin-1 when they are not valid
/// UTF-8, so older headers with 8-bit comments still parse.
pub fn decode_source(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!(at = err.utf8_error().valid_up_to(), "source is not UTF-8, reading as Latin-1");
            err.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

/// Reads and parses one input file.
pub fn parse_file(session: &mut Session, path: &Path) -> Result<()> {
    let io_error = |source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    };
    let source = decode_source(fs::read(path).map_err(io_error)?);
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok();

    let name = path.to_string_lossy();
    session.begin_file(Some(&name), modified);
    info!(file = %name, "parsing");
    parse_source(session, &source)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use c2man_core::Options;

    use super::*;

    #[test]
    fn test_parse_file_records_source() {
        let mut file = tempfile::Builder::new().suffix(".h").tempfile().unwrap();
        writeln!(file, "/* Resets the device. */\nvoid reset(void);").unwrap();

        let mut session = Session::new(Options::default());
        parse_file(&mut session, file.path()).unwrap();

        assert_eq!(session.input_files, 1);
        assert!(session.source.header_file);
        let page = &session.pages.pages()[0];
        assert_eq!(page.name(), "reset");
        assert!(page.sourcetime.is_some());
        assert_eq!(
            page.sourcefile.as_deref(),
            Some(file.path().to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_parse_file_accepts_latin1_comments() {
        let mut file = tempfile::Builder::new().suffix(".h").tempfile().unwrap();
        file.write_all(b"/* Copyright \xa9 1995. */\n\n/* Resets the device. */\nvoid reset(void);\n")
            .unwrap();

        let mut session = Session::new(Options::default());
        parse_file(&mut session, file.path()).unwrap();
        assert_eq!(session.pages.len(), 1);
        assert_eq!(session.pages.pages()[0].name(), "reset");
    }

    #[test]
    fn test_decode_source() {
        assert_eq!(decode_source("caf\u{e9}".as_bytes().to_vec()), "caf\u{e9}");
        assert_eq!(decode_source(b"(\xa9) 1995".to_vec()), "(\u{a9}) 1995");
    }

    #[test]
    fn test_parse_file_missing() {
        let mut session = Session::new(Options::default());
        let err = parse_file(&mut session, Path::new("/nonexistent/x.h")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
        assert!(err.to_string().starts_with("cannot read /nonexistent/x.h"));
    }

    #[test]
    fn test_group_terse_from_first_comment() {
        let mut session = Session::new(Options {
            group_together: true,
            ..Options::default()
        });
        session.begin_file(Some("str.h"), None);
        parse_source(
            &mut session,
            "/* str - string helpers */\n\n/* Length. */\nint len(const char *s);",
        )
        .unwrap();
        assert_eq!(session.group_terse.as_deref(), Some("string helpers"));
        assert_eq!(session.pages.pages()[0].comment(), Some("Length."));
    }

    #[test]
    fn test_stdin_uses_first_line_marker() {
        let mut session = Session::new(Options::default());
        session.begin_file(None, None);
        let src = "# 1 \"lib.h\"\n/* Mine. */\nint mine(void);\n# 1 \"dep.h\" 1\n/* Dep. */\nint dep(void);";
        parse_source(&mut session, src).unwrap();
        assert_eq!(session.pages.len(), 1);
        assert_eq!(session.pages.pages()[0].name(), "mine");
    }
}
