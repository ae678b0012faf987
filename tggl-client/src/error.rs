// Client error types

use tggl_flags::FlagError;
use tggl_http_client::HttpClientError;
use tggl_reporting::ReportingError;
use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised by the Tggl clients
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API could not be reached or answered with an error status
    #[error("Transport error: {0}")]
    Transport(#[from] HttpClientError),

    /// The API returned flag definitions that could not be decoded
    #[error("Invalid flag definition: {0}")]
    Definition(#[from] FlagError),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client was closed before it became ready
    #[error("Client is closed")]
    Closed,
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Definition(_))
    }
}

impl From<ReportingError> for ClientError {
    fn from(err: ReportingError) -> Self {
        match err {
            ReportingError::Transport(e) => Self::Transport(e),
            ReportingError::Serialization(message) => Self::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Config("TGGL_POLLING_INTERVAL is not a number".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: TGGL_POLLING_INTERVAL is not a number"
        );
        assert_eq!(ClientError::Closed.to_string(), "Client is closed");
    }

    #[test]
    fn test_definition_from_flag_error() {
        let err: ClientError = FlagError::UnknownOperator("NOPE".into()).into();
        assert!(err.is_definition());
        assert!(!err.is_transport());
        assert!(err.to_string().contains("NOPE"));
    }

    #[test]
    fn test_transport_from_reporting_error() {
        let err: ClientError = ReportingError::Transport(HttpClientError::Connection(
            "refused".into(),
        ))
        .into();
        assert!(err.is_transport());
    }
}
