use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the parsing of an input file.
///
/// Syntax errors inside a file are not fatal; they are recorded on the
/// session and parsing resumes at the next declaration.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{file}:{line}: unterminated comment")]
    UnterminatedComment { file: String, line: usize },

    #[error("{file}:{line}: unterminated string or character constant")]
    UnterminatedLiteral { file: String, line: usize },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
