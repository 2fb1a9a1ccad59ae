//! Error types for the declaration model and configuration.

use thiserror::Error;

/// Conflicts found while building the declaration model.
///
/// None of these stop parsing: the offending comment or override is dropped,
/// the error is counted, and rendering is skipped at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("parameter '{0}' has multiple comments")]
    ParameterComments(String),

    #[error("declarator '{0}' has multiple comments")]
    DeclaratorComments(String),

    #[error("enumerator '{0}' has multiple comments")]
    EnumeratorComments(String),

    /// A K&R parameter declaration with a comment both before and after it.
    #[error("parameter declaration has multiple comments")]
    ParameterDeclarationComments,

    /// A K&R parameter declared with a specifier or enum type that
    /// contradicts an earlier declaration of the same parameter.
    #[error("parameter '{0}' has conflicting declarations")]
    ParameterTypeConflict(String),

    #[error("comment '{0}' applies to non-existent parameter")]
    OrphanComment(String),

    /// A K&R definition declares a name missing from its identifier list.
    #[error("declared argument \"{0}\" is missing")]
    MissingArgument(String),
}

/// A diagnostic with the source position it was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}: {}", self.line, self.message),
            None => write!(f, "stdin:{}: {}", self.line, self.message),
        }
    }
}

/// Errors raised while loading or validating options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("invalid prototype template: {0}")]
    InvalidTemplate(String),

    #[error("invalid object output option: {0}")]
    InvalidObjectOption(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
