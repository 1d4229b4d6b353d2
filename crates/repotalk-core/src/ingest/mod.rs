//! Repository ingestion: existence probe, digest, size policy.

pub mod service;
pub mod size;
pub mod source;

pub use service::{IngestPolicy, IngestService};
pub use size::TokenEstimate;
pub use source::{RepoDigester, RepoProbe};
