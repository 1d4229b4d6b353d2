//! Key-rotating generation client.
//!
//! Process-wide state shared by all sessions: an ordered list of API keys
//! and a cursor marking the current one. When the backend reports quota
//! exhaustion the cursor advances and the call retries with the next key;
//! once the cursor walks past the last key the client is exhausted and
//! every subsequent call fails fast with `OutOfKeys` until the process is
//! restarted with fresh keys.

use std::sync::Mutex;

use secrecy::SecretString;

use repotalk_types::error::GenerateError;

use super::backend::GenerationBackend;

/// Routes generation calls through a list of API keys, rotating forward on
/// quota exhaustion.
///
/// The cursor only moves forward. A key that has reported quota exhaustion
/// is never revisited, so a single `generate` call makes at most one
/// attempt per configured key.
pub struct RotatingClient<B> {
    backend: B,
    keys: Vec<SecretString>,
    cursor: Mutex<usize>,
}

impl<B: GenerationBackend> RotatingClient<B> {
    pub fn new(backend: B, keys: Vec<SecretString>) -> Self {
        Self {
            backend,
            keys,
            cursor: Mutex::new(0),
        }
    }

    /// Number of configured keys.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Send a prompt to the backend, rotating keys on quota exhaustion.
    ///
    /// Returns the generated text verbatim on success. Fails with
    /// [`GenerateError::OutOfKeys`] once every key has been exhausted; any
    /// non-quota backend error propagates unchanged without rotating.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        loop {
            let observed = *self.cursor.lock().expect("cursor lock poisoned");
            let Some(key) = self.keys.get(observed) else {
                return Err(GenerateError::OutOfKeys);
            };

            match self.backend.generate(key, prompt).await {
                Ok(text) => return Ok(text),
                Err(GenerateError::QuotaExhausted) => {
                    self.advance_from(observed);
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Advance the cursor past `observed`, unless another caller already
    /// moved it. The compare ensures concurrent callers that both saw the
    /// same exhausted key advance the cursor exactly once.
    fn advance_from(&self, observed: usize) {
        let mut cursor = self.cursor.lock().expect("cursor lock poisoned");
        if *cursor == observed {
            *cursor += 1;
            tracing::warn!(
                exhausted_key_index = observed,
                remaining = self.keys.len().saturating_sub(*cursor),
                "API key quota exhausted, rotating"
            );
        }
    }
}
