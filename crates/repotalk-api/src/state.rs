//! Application state and config loading.
//!
//! `AppState` pins the generic core services to the concrete infra
//! implementations and is shared by every connection handler. Config comes
//! from an optional `repotalk.toml` plus environment overrides.

use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;

use repotalk_core::chat::SessionRegistry;
use repotalk_core::ingest::{IngestPolicy, IngestService};
use repotalk_core::llm::RotatingClient;
use repotalk_infra::github::{GithubDigester, GithubProbe};
use repotalk_infra::llm::GeminiBackend;
use repotalk_types::config::AppConfig;

use crate::http::ws::WsTransport;

/// Environment variable carrying comma-separated Gemini API keys.
/// Takes precedence over keys listed in the config file.
pub const API_KEYS_ENV: &str = "REPOTALK_GEMINI_API_KEYS";

/// Default config file name, looked up in the working directory.
const CONFIG_FILE: &str = "repotalk.toml";

/// Concrete type aliases for the core generics pinned to infra
/// implementations.
pub type ConcreteIngestService = IngestService<GithubProbe, GithubDigester>;
pub type ConcreteGenerator = RotatingClient<GeminiBackend>;
pub type ConcreteRegistry =
    SessionRegistry<WsTransport, GithubProbe, GithubDigester, GeminiBackend>;

/// Shared application state for the WebSocket server.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConcreteRegistry>,
}

impl AppState {
    /// Wire the registry from config: GitHub collaborators, Gemini backend,
    /// key list.
    pub fn init(config: &AppConfig) -> Self {
        let registry = SessionRegistry::new(build_ingest_service(config), build_generator(config));
        Self {
            registry: Arc::new(registry),
        }
    }
}

/// Build the ingestion service from config.
pub fn build_ingest_service(config: &AppConfig) -> ConcreteIngestService {
    IngestService::new(
        GithubProbe::new(),
        GithubDigester::new(config.ingest.max_file_bytes),
        IngestPolicy::from(&config.ingest),
    )
}

/// Build the key-rotating Gemini client from config.
pub fn build_generator(config: &AppConfig) -> ConcreteGenerator {
    let keys: Vec<SecretString> = config
        .gemini
        .api_keys
        .iter()
        .map(|key| SecretString::from(key.clone()))
        .collect();
    RotatingClient::new(GeminiBackend::new(config.gemini.model.clone()), keys)
}

/// Load configuration: `repotalk.toml` if present (or an explicit `--config`
/// path, which must exist), then the API-keys environment override.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| anyhow::anyhow!("reading {}: {err}", path.display()))?;
            AppConfig::from_toml_str(&text)?
        }
        None => match std::fs::read_to_string(CONFIG_FILE) {
            Ok(text) => AppConfig::from_toml_str(&text)?,
            Err(_) => AppConfig::default(),
        },
    };

    if let Ok(raw) = std::env::var(API_KEYS_ENV) {
        config.gemini.api_keys = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(String::from)
            .collect();
    }

    if config.gemini.api_keys.is_empty() {
        tracing::warn!(
            "no Gemini API keys configured; every query will fail until {API_KEYS_ENV} is set"
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9090").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_load_config_missing_explicit_path_is_an_error() {
        let missing = Path::new("/nonexistent/repotalk.toml");
        assert!(load_config(Some(missing)).is_err());
    }

    #[test]
    fn test_state_init_builds_registry() {
        let state = AppState::init(&AppConfig::default());
        assert_eq!(state.registry.session_count(), 0);
    }
}
