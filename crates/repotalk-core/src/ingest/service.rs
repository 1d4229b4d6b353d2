//! Ingestion orchestration: probe, digest, size policy, failure
//! classification.

use repotalk_types::error::{IngestError, SourceError};
use repotalk_types::repo::{RepoDigest, RepoRef};

use super::size::{TokenEstimate, parse_token_estimate};
use super::source::{RepoDigester, RepoProbe};

/// Exclusion patterns and size limits applied to every ingestion.
#[derive(Debug, Clone)]
pub struct IngestPolicy {
    /// Paths matching these patterns are skipped.
    pub exclude_patterns: Vec<String>,
    /// Maximum estimated size, in thousands of tokens. Million-scale
    /// estimates are rejected regardless of this limit.
    pub max_kilo_tokens: f64,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            exclude_patterns: vec!["tests/*".to_string(), "docs/*".to_string()],
            max_kilo_tokens: 750.0,
        }
    }
}

impl From<&repotalk_types::config::IngestConfig> for IngestPolicy {
    fn from(config: &repotalk_types::config::IngestConfig) -> Self {
        Self {
            exclude_patterns: config.exclude_patterns.clone(),
            max_kilo_tokens: config.max_kilo_tokens,
        }
    }
}

/// Drives one repository ingestion: existence probe, digest, size check.
///
/// Idempotent and safe to call repeatedly for the same repository; the
/// session registry caches the result per session rather than re-calling.
pub struct IngestService<P, D> {
    probe: P,
    digester: D,
    policy: IngestPolicy,
}

impl<P: RepoProbe, D: RepoDigester> IngestService<P, D> {
    pub fn new(probe: P, digester: D, policy: IngestPolicy) -> Self {
        Self {
            probe,
            digester,
            policy,
        }
    }

    /// Ingest a repository into a digest.
    ///
    /// Fails with [`IngestError::NotFound`] before the digester is ever
    /// invoked when the existence probe says no. The digest's summary is
    /// then checked against the size policy, and digester failures are
    /// classified into the named failure kinds.
    pub async fn ingest(&self, repo: &RepoRef) -> Result<RepoDigest, IngestError> {
        if !self.probe.exists(repo).await {
            return Err(IngestError::NotFound);
        }

        let digest = self
            .digester
            .digest(repo, &self.policy.exclude_patterns)
            .await
            .map_err(classify_source_error)?;

        match parse_token_estimate(&digest.summary) {
            Some(TokenEstimate::Mega(_)) => Err(IngestError::TooLarge),
            Some(TokenEstimate::Kilo(kilo)) if kilo > self.policy.max_kilo_tokens => {
                Err(IngestError::TooLarge)
            }
            _ => Ok(digest),
        }
    }
}

/// Map a digester failure onto the ingestion error taxonomy.
///
/// Structured categories map directly. `Other` falls back to substring
/// matching on the raw message (a compatibility shim for upstream errors
/// that arrive as bare text); anything unrecognized is propagated
/// unchanged as `Upstream`.
fn classify_source_error(err: SourceError) -> IngestError {
    match err {
        SourceError::NotFound => IngestError::NotFound,
        SourceError::BadCredentials | SourceError::RateLimited => IngestError::Private,
        SourceError::Other(message) => {
            let lower = message.to_lowercase();
            if lower.contains("not found") {
                IngestError::NotFound
            } else if lower.contains("bad credentials") || lower.contains("rate limit") {
                IngestError::Private
            } else {
                IngestError::Upstream(message)
            }
        }
    }
}
