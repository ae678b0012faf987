//! Flag definition errors.

use thiserror::Error;

/// Result type for flag definition operations.
pub type Result<T> = std::result::Result<T, FlagError>;

/// Errors raised while decoding flag definitions.
///
/// A loaded snapshot never fails during evaluation. An unknown operator
/// rejects the definitions; an invalid pattern is only reported by
/// [`Rule::validate`](crate::Rule::validate).
#[derive(Debug, Error)]
pub enum FlagError {
    /// The operator name is not in the operator table.
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// A `REGEXP` rule carries a pattern that does not compile.
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// A definition or context could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FlagError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
