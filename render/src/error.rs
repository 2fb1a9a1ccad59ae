//! Error types for page rendering and output.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring a driver or writing pages.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot link {} to {}: {source}", link.display(), target.display())]
    Link {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An option the driver knows but whose value is out of range.
    #[error("invalid {format} option: {option}")]
    InvalidOption { format: &'static str, option: String },

    /// An option the driver does not know at all.
    #[error("{format} output takes no option '{option}'")]
    UnsupportedOption { format: &'static str, option: String },

    #[error("I/O error: {0}")]
    Stdout(#[from] std::io::Error),
}

/// Convenience alias for results with [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;
