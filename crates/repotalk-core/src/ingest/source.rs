//! Collaborator traits for the ingestion pipeline.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition). Concrete
//! implementations live in `repotalk-infra` (GitHub REST API); tests use
//! in-memory mocks.

use repotalk_types::error::SourceError;
use repotalk_types::repo::{RepoDigest, RepoRef};

/// Existence probe for a repository.
///
/// A single network check that the repository exists and is publicly
/// reachable, performed before the (much more expensive) digest.
pub trait RepoProbe: Send + Sync {
    /// `true` only on an explicit "found" response. Any non-success status
    /// or transport-level failure yields `false` -- the caller only needs a
    /// boolean, so failures are swallowed, not propagated. No retries.
    fn exists(&self, repo: &RepoRef) -> impl std::future::Future<Output = bool> + Send;
}

/// Produces the textual digest of a repository.
pub trait RepoDigester: Send + Sync {
    /// Convert the repository into a `(summary, tree, content)` digest,
    /// skipping paths that match any of `exclude`.
    ///
    /// Implementations report structured [`SourceError`] categories where
    /// they can; anything unclassifiable goes through `SourceError::Other`
    /// with the raw message preserved.
    fn digest(
        &self,
        repo: &RepoRef,
        exclude: &[String],
    ) -> impl std::future::Future<Output = Result<RepoDigest, SourceError>> + Send;
}
