//! Unified error types for hakken.
//!
//! Every per-candidate failure is one of these variants; the pipeline turns
//! them into "no record produced" and counts them by kind.

use tokio_rusqlite::rusqlite;

use crate::schema::SchemaError;

/// Unified error types for the discovery engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an inverted search range).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Transport failure or non-success status while fetching content.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Search or tree API call failed.
    #[error("API_ERROR: {0}")]
    Api(String),

    /// Payload is not JSON or not a JSON object.
    #[error("MALFORMED_CONTENT: {0}")]
    MalformedContent(String),

    /// Payload is a JSON object that does not match the series schema.
    #[error("SCHEMA_INVALID: {0}")]
    SchemaInvalid(#[from] SchemaError),

    /// The digest already carries a negative verdict in the dedup cache.
    #[error("PREVIOUSLY_REJECTED: {0}")]
    PreviouslyRejected(String),
}

impl Error {
    /// Whether this error came from the network rather than the content.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::FetchTimeout(_) | Error::FetchTooLarge(_) | Error::HttpError(_) | Error::Api(_) | Error::InvalidUrl(_)
        )
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PreviouslyRejected("abc123".to_string());
        assert!(err.to_string().contains("PREVIOUSLY_REJECTED"));
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_schema_error_display() {
        let err: Error = SchemaError::MissingField("chapters").into();
        assert_eq!(err.to_string(), "SCHEMA_INVALID: missing required field: chapters");
    }

    #[test]
    fn test_network_classification() {
        assert!(Error::FetchTimeout("slow".into()).is_network());
        assert!(Error::HttpError("status 404".into()).is_network());
        assert!(!Error::MalformedContent("not json".into()).is_network());
        assert!(!Error::from(SchemaError::NoValidChapters).is_network());
    }
}
