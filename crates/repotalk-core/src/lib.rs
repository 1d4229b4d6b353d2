//! Domain logic for Repotalk.
//!
//! This crate owns everything between the transport and the outside world:
//! the ingestion pipeline (existence probe, digest, size policy, failure
//! classification), prompt assembly, the key-rotating generation client,
//! and the session registry that drives the per-message request/response
//! cycle.
//!
//! Collaborators are reached through traits ([`ingest::RepoProbe`],
//! [`ingest::RepoDigester`], [`llm::GenerationBackend`],
//! [`chat::SessionTransport`]); concrete HTTP implementations live in
//! `repotalk-infra`.

pub mod chat;
pub mod ingest;
pub mod llm;
