use thiserror::Error;

/// Error categories reported by a repository digester.
///
/// Digester implementations report structured categories where they can
/// classify the failure themselves; `Other` carries the raw message for
/// upstream errors that have no structured mapping. The ingestion service
/// falls back to substring matching on `Other` messages as a best-effort
/// compatibility shim.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("repository not found")]
    NotFound,

    #[error("bad credentials")]
    BadCredentials,

    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("{0}")]
    Other(String),
}

/// Errors from the ingestion pipeline, as surfaced to the session registry.
///
/// `NotFound`, `TooLarge`, and `Private` are user-facing: the registry
/// translates them into fixed protocol tokens. `Upstream` is unclassified
/// and crosses the registry boundary unchanged so it reaches operational
/// logs.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("repository not found")]
    NotFound,

    #[error("repository too large")]
    TooLarge,

    #[error("repository requires authentication")]
    Private,

    #[error("ingestion failed: {0}")]
    Upstream(String),
}

/// Errors from generation backends and the key-rotating client.
///
/// `QuotaExhausted` is backend-level only: the rotating client consumes it
/// to drive rotation and never returns it to callers. `OutOfKeys` is what
/// callers see once every configured key has been tried.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("quota exhausted for current API key")]
    QuotaExhausted,

    #[error("all API keys exhausted")]
    OutOfKeys,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Errors from a session transport.
///
/// A failed send means the client is gone; the registry treats it as a
/// disconnect. Close failures are swallowed by transport implementations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed: {0}")]
    Closed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_display() {
        assert_eq!(IngestError::NotFound.to_string(), "repository not found");
        assert_eq!(IngestError::TooLarge.to_string(), "repository too large");
        assert_eq!(
            IngestError::Upstream("tls handshake failed".to_string()).to_string(),
            "ingestion failed: tls handshake failed"
        );
    }

    #[test]
    fn test_generate_error_display() {
        assert_eq!(
            GenerateError::OutOfKeys.to_string(),
            "all API keys exhausted"
        );
        let err = GenerateError::Provider {
            message: "HTTP 503".to_string(),
        };
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_source_error_other_preserves_message() {
        let err = SourceError::Other("clone failed: host unreachable".to_string());
        assert_eq!(err.to_string(), "clone failed: host unreachable");
    }
}
