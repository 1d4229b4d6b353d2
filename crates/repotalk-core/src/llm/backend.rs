//! GenerationBackend trait definition.

use repotalk_types::error::GenerateError;
use secrecy::SecretString;

/// A text-generation backend (Gemini in production, mocks in tests).
///
/// The credential is passed per call rather than held by the backend, so
/// that key ownership and rotation stay in [`super::RotatingClient`].
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Implementations classify their provider's quota signal into
/// [`GenerateError::QuotaExhausted`]; every other failure is reported in
/// its own category and is never retried by the rotating client.
pub trait GenerationBackend: Send + Sync {
    fn generate(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, GenerateError>> + Send;
}
