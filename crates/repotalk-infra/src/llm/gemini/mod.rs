//! Gemini generation backend (generateContent REST API).

mod client;
mod types;

pub use client::GeminiBackend;
