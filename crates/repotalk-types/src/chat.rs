//! Chat protocol vocabulary and conversation types.
//!
//! The WebSocket protocol is plain UTF-8 text in both directions. The
//! server-to-client control tokens below are the only structured part;
//! anything else sent to the client is either a generated answer or the
//! fixed rate-limit message.

use serde::{Deserialize, Serialize};

/// Sent once ingestion succeeds and the session is ready for queries.
pub const REPO_PROCESSED: &str = "repo_processed";

/// Ingestion failed: repository exceeds the token-size policy.
pub const ERR_REPO_TOO_LARGE: &str = "error:repo_too_large";

/// Ingestion failed: repository does not exist or is not reachable.
pub const ERR_REPO_NOT_FOUND: &str = "error:repo_not_found";

/// Ingestion failed: repository requires authentication.
pub const ERR_REPO_PRIVATE: &str = "error:repo_private";

/// Ingestion failed for an unclassified reason. The underlying error is
/// logged server-side; the client only sees this generic token.
pub const ERR_INTERNAL: &str = "error:internal";

/// Sent in place of an answer when every configured API key has reported
/// quota exhaustion.
pub const RATE_LIMIT_EXHAUSTED_MESSAGE: &str =
    "All API keys have been exhausted. Please try again in a few minutes.";

/// One completed conversation turn: a user query and the generated answer.
///
/// History is an append-only `Vec<Exchange>`; insertion order is meaningful
/// and is replayed verbatim when building follow-up prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub response: String,
}

impl Exchange {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_stable() {
        // These strings are parsed by deployed clients; they must not drift.
        assert_eq!(REPO_PROCESSED, "repo_processed");
        assert_eq!(ERR_REPO_TOO_LARGE, "error:repo_too_large");
        assert_eq!(ERR_REPO_NOT_FOUND, "error:repo_not_found");
        assert_eq!(ERR_REPO_PRIVATE, "error:repo_private");
    }

    #[test]
    fn test_exchange_serde_roundtrip() {
        let exchange = Exchange::new("What does this repo do?", "It talks to GitHub.");
        let json = serde_json::to_string(&exchange).unwrap();
        let parsed: Exchange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, exchange);
    }
}
