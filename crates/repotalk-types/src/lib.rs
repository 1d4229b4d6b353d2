//! Shared domain types for Repotalk.
//!
//! This crate contains the types used across the Repotalk server: repository
//! references and digests, chat protocol tokens, configuration, and the
//! error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod error;
pub mod repo;
