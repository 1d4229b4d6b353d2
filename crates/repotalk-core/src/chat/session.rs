//! Per-connection session state.

use chrono::{DateTime, Utc};

use repotalk_types::chat::Exchange;
use repotalk_types::repo::{RepoDigest, RepoRef};

/// Server-side state for one open client connection.
///
/// Created by the registry once ingestion succeeds; mutated only by the
/// registry in response to inbound messages (history grows by one exchange
/// per successful round trip); destroyed on disconnect or replacement by a
/// same-id session.
pub struct Session<T> {
    /// Exclusively owned sending half of the client connection.
    pub transport: T,
    /// Target repository, immutable for the session's lifetime.
    pub repo: RepoRef,
    /// Cached ingestion result, read-only after creation.
    pub digest: RepoDigest,
    /// Ordered conversation history, append-only.
    pub history: Vec<Exchange>,
    pub opened_at: DateTime<Utc>,
}

impl<T> Session<T> {
    pub fn new(transport: T, repo: RepoRef, digest: RepoDigest) -> Self {
        Self {
            transport,
            repo,
            digest,
            history: Vec::new(),
            opened_at: Utc::now(),
        }
    }
}
