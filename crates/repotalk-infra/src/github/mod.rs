//! GitHub REST API collaborators: existence probe and repository digester.

pub mod digester;
pub mod probe;
pub mod tree;

pub use digester::GithubDigester;
pub use probe::GithubProbe;

/// Default base URL for the GitHub REST API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
