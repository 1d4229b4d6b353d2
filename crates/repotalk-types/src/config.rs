//! Configuration types for the Repotalk server.
//!
//! `AppConfig` represents the optional `repotalk.toml` file. All fields have
//! defaults, so an empty file (or no file at all) yields a working config.
//! API keys are normally injected via the `REPOTALK_GEMINI_API_KEYS`
//! environment variable rather than written to disk; the loader in the api
//! crate applies that override.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Parse a config from TOML text. Unknown keys are ignored.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Bind address for the HTTP/WebSocket server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Gemini generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model identifier passed to the generateContent endpoint.
    #[serde(default = "default_model")]
    pub model: String,

    /// Candidate API keys, tried in order as quota is exhausted.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_keys: Vec::new(),
        }
    }
}

/// Ingestion size policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Reject repositories whose estimated token count exceeds this many
    /// thousand tokens. Million-scale estimates are always rejected.
    #[serde(default = "default_max_kilo_tokens")]
    pub max_kilo_tokens: f64,

    /// Paths matching these patterns are skipped during ingestion.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Individual files larger than this are skipped.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_max_kilo_tokens() -> f64 {
    750.0
}

fn default_exclude_patterns() -> Vec<String> {
    vec!["tests/*".to_string(), "docs/*".to_string()]
}

fn default_max_file_bytes() -> u64 {
    100_000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_kilo_tokens: default_max_kilo_tokens(),
            exclude_patterns: default_exclude_patterns(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert!(config.gemini.api_keys.is_empty());
        assert!((config.ingest.max_kilo_tokens - 750.0).abs() < f64::EPSILON);
        assert_eq!(
            config.ingest.exclude_patterns,
            vec!["tests/*".to_string(), "docs/*".to_string()]
        );
    }

    #[test]
    fn test_partial_toml_overrides() {
        let text = r#"
            [server]
            port = 9001

            [gemini]
            api_keys = ["key-a", "key-b"]
        "#;
        let config = AppConfig::from_toml_str(text).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.gemini.api_keys.len(), 2);
        // Untouched sections keep their defaults.
        assert_eq!(config.ingest.max_file_bytes, 100_000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(AppConfig::from_toml_str("server = [").is_err());
    }
}
