//! GeminiBackend -- concrete [`GenerationBackend`] for the Gemini API.
//!
//! Sends non-streaming generateContent requests. The API key arrives per
//! call from the rotating client, wrapped in [`secrecy::SecretString`],
//! and is only exposed while building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use repotalk_core::llm::GenerationBackend;
use repotalk_types::error::GenerateError;

use super::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

/// Gemini generation backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min timeout for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model,
        }
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

// GeminiBackend intentionally does not derive Debug so no internal state
// can leak into logs.

impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<String, GenerateError> {
        let body = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .client
            .post(self.generate_endpoint())
            .header("x-goog-api-key", api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerateError::Provider {
                message: format!("HTTP request failed: {err}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerateError::Deserialization(format!("failed to parse response: {err}")))?;

        parsed
            .text()
            .ok_or_else(|| GenerateError::Deserialization("response contained no text".to_string()))
    }
}

/// Classify a non-success response into the generation error taxonomy.
///
/// Quota exhaustion is the signal the rotating client acts on: HTTP 429,
/// or an error envelope whose status is `RESOURCE_EXHAUSTED`. Bad requests
/// surface as `InvalidRequest` and are never retried with another key.
fn classify_failure(status: reqwest::StatusCode, body: &str) -> GenerateError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error)
        .ok();

    let quota = status.as_u16() == 429
        || detail
            .as_ref()
            .is_some_and(|d| d.status == "RESOURCE_EXHAUSTED")
        || body.contains("RESOURCE_EXHAUSTED");
    if quota {
        return GenerateError::QuotaExhausted;
    }

    let message = detail
        .map(|d| d.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));

    if status.as_u16() == 400 {
        GenerateError::InvalidRequest(message)
    } else {
        GenerateError::Provider { message }
    }
}
