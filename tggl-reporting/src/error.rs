//! Reporting error types

use thiserror::Error;

/// Result type for reporting operations
pub type Result<T> = std::result::Result<T, ReportingError>;

/// Errors that can occur while sending usage reports
///
/// These never reach evaluation callers: `flush` logs and drops them.
#[derive(Debug, Error)]
pub enum ReportingError {
    /// The report could not be delivered
    #[error("Transport error: {0}")]
    Transport(#[from] tggl_http_client::HttpClientError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ReportingError {
    fn from(err: serde_json::Error) -> Self {
        ReportingError::Serialization(err.to_string())
    }
}
