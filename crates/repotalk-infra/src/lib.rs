//! Infrastructure implementations for Repotalk.
//!
//! Concrete collaborators behind the traits defined in `repotalk-core`:
//! the GitHub existence probe and repository digester (GitHub REST API via
//! `reqwest`), and the Gemini generation backend.

pub mod github;
pub mod llm;
