//! GitHub repository digester.
//!
//! Converts a public repository into the `(summary, tree, content)` digest
//! using the GitHub REST API: repo metadata for the default branch, the
//! recursive git tree for the file listing, and blob fetches for content.
//! Everything rides on one base URL so tests can point it at a local
//! server.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::{StreamExt, stream};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use repotalk_core::ingest::RepoDigester;
use repotalk_types::error::SourceError;
use repotalk_types::repo::{RepoDigest, RepoRef};

use super::DEFAULT_API_BASE;
use super::tree::{format_token_estimate, render_tree};

/// How many blob fetches run concurrently.
const BLOB_FETCH_CONCURRENCY: usize = 8;

/// File separator used in the concatenated content section.
const FILE_SEPARATOR: &str = "================================================";

/// Extensions that are never text; files carrying them are skipped.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "webp", "pdf", "zip", "gz", "tar", "tgz", "bz2", "xz",
    "7z", "woff", "woff2", "ttf", "otf", "eot", "exe", "dll", "so", "dylib", "a", "o", "bin",
    "dat", "class", "jar", "pyc", "wasm", "mp3", "mp4", "avi", "mov", "webm", "db", "sqlite",
];

#[derive(Debug, Deserialize)]
struct RepoMeta {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

/// Digests a repository through the GitHub REST API.
pub struct GithubDigester {
    client: reqwest::Client,
    base_url: String,
    max_file_bytes: u64,
}

impl GithubDigester {
    pub fn new(max_file_bytes: u64) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repotalk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: DEFAULT_API_BASE.to_string(),
            max_file_bytes,
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url)
            .header("accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|err| SourceError::Other(format!("GET {url}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|err| SourceError::Other(format!("decoding {url}: {err}")))
    }

    /// Fetch one blob and decode it to text. Returns `Ok(None)` for blobs
    /// that turn out not to be text after all.
    async fn fetch_text(
        &self,
        repo: &RepoRef,
        entry: &TreeEntry,
    ) -> Result<Option<String>, SourceError> {
        let url = format!(
            "{}/repos/{}/{}/git/blobs/{}",
            self.base_url, repo.owner, repo.repo, entry.sha
        );
        let blob: BlobResponse = self.get_json(&url).await?;

        if blob.encoding != "base64" {
            tracing::debug!(path = %entry.path, encoding = %blob.encoding, "unexpected blob encoding, skipping");
            return Ok(None);
        }

        Ok(decode_blob(&blob.content))
    }
}

impl RepoDigester for GithubDigester {
    async fn digest(
        &self,
        repo: &RepoRef,
        exclude: &[String],
    ) -> Result<RepoDigest, SourceError> {
        let meta: RepoMeta = self
            .get_json(&format!(
                "{}/repos/{}/{}",
                self.base_url, repo.owner, repo.repo
            ))
            .await?;

        let listing: TreeResponse = self
            .get_json(&format!(
                "{}/repos/{}/{}/git/trees/{}?recursive=1",
                self.base_url, repo.owner, repo.repo, meta.default_branch
            ))
            .await?;

        if listing.truncated {
            tracing::warn!(repo = %repo, "tree listing truncated by GitHub, digest will be partial");
        }

        let files: Vec<TreeEntry> = listing
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .filter(|entry| !is_excluded(&entry.path, exclude))
            .filter(|entry| is_probably_text(&entry.path))
            .filter(|entry| entry.size.unwrap_or(0) <= self.max_file_bytes)
            .collect();

        let fetched: Vec<Result<(String, Option<String>), SourceError>> = stream::iter(files)
            .map(|entry| async move {
                let text = self.fetch_text(repo, &entry).await?;
                Ok((entry.path.clone(), text))
            })
            .buffered(BLOB_FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut paths = Vec::new();
        let mut content = String::new();
        for result in fetched {
            let (path, text) = result?;
            let Some(text) = text else { continue };
            paths.push(path.clone());
            content.push_str(FILE_SEPARATOR);
            content.push('\n');
            content.push_str("FILE: ");
            content.push_str(&path);
            content.push('\n');
            content.push_str(FILE_SEPARATOR);
            content.push('\n');
            content.push_str(&text);
            content.push_str("\n\n");
        }

        let root_name = format!("{}-{}", repo.owner, repo.repo);
        let tree = render_tree(&root_name, &paths);

        let estimate = format_token_estimate(content.len() / 4);
        let summary = format!(
            "Repository: {}/{}\nBranch: {}\nFiles analyzed: {}\nEstimated tokens: {}",
            repo.owner,
            repo.repo,
            meta.default_branch,
            paths.len(),
            estimate
        );

        Ok(RepoDigest {
            summary,
            tree,
            content,
        })
    }
}

/// Map a non-success GitHub status onto a structured source error.
fn classify_status(status: reqwest::StatusCode, body: &str) -> SourceError {
    match status.as_u16() {
        404 => SourceError::NotFound,
        401 => SourceError::BadCredentials,
        403 | 429 if body.contains("rate limit") => SourceError::RateLimited,
        403 => SourceError::BadCredentials,
        _ => SourceError::Other(format!("HTTP {status}: {body}")),
    }
}

/// Whether a path matches any exclusion pattern.
///
/// Two pattern shapes are supported: `dir/*` (matches everything under a
/// directory of that name, at any depth) and an exact path. This covers
/// the configured policy patterns; anything fancier belongs in the config
/// layer.
fn is_excluded(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if let Some(dir) = pattern.strip_suffix("/*") {
            let prefix = format!("{dir}/");
            path.starts_with(&prefix) || path.contains(&format!("/{prefix}"))
        } else {
            path == pattern
        }
    })
}

/// Extension-based text heuristic; the blob decode is the final arbiter.
fn is_probably_text(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => !BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => true,
    }
}

/// Decode a base64 blob (GitHub inserts newlines) into UTF-8 text.
/// Returns `None` when the bytes are not valid base64 or not UTF-8.
fn decode_blob(content: &str) -> Option<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}
