//! GitHub repository existence probe.

use std::time::Duration;

use repotalk_core::ingest::RepoProbe;
use repotalk_types::repo::RepoRef;

use super::DEFAULT_API_BASE;

/// Checks that a repository exists and is publicly reachable.
///
/// One GET against the repos endpoint, no retries. The caller only needs a
/// boolean, so every failure mode (non-200 status, timeout, DNS error)
/// collapses to `false`.
pub struct GithubProbe {
    client: reqwest::Client,
    base_url: String,
}

impl GithubProbe {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repotalk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn repo_endpoint(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.repo)
    }
}

impl Default for GithubProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoProbe for GithubProbe {
    async fn exists(&self, repo: &RepoRef) -> bool {
        let url = self.repo_endpoint(repo);
        match self.client.get(&url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(err) => {
                tracing::debug!(repo = %repo, error = %err, "existence probe failed");
                false
            }
        }
    }
}
