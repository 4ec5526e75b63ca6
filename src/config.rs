//! Application configuration
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `INTERVIEW_FEEDBACK__*` environment variables
//! (double underscore separates sections, e.g. `INTERVIEW_FEEDBACK__LLM__MODEL`).

use crate::error::{FeedbackError, Result};
use crate::services::LlmConfig;
use crate::storage::libsql::ConnectionMode;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "INTERVIEW_FEEDBACK";

/// Config file looked up when none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "interview-feedback.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub store: StoreSettings,
}

/// Structured completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Falls back to `ANTHROPIC_API_KEY` when unset
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub endpoint: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let defaults = LlmConfig {
            api_key: String::new(),
            ..LlmConfig::default()
        };
        Self {
            api_key: None,
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            endpoint: defaults.endpoint,
        }
    }
}

/// Which document store backs the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process memory; nothing survives exit
    Memory,
    /// Local libSQL file
    Local,
    /// Remote libSQL (Turso)
    Remote,
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,

    /// Database file for the `local` backend
    pub path: Option<PathBuf>,

    /// Database URL for the `remote` backend
    pub url: Option<String>,

    /// Auth token for the `remote` backend
    pub token: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local,
            path: None,
            url: None,
            token: None,
        }
    }
}

/// Get the default database path using XDG_DATA_HOME standard
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("interview-feedback")
        .join("documents.db")
}

impl AppConfig {
    /// Load defaults, the config file (if present) and environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        debug!("Loading configuration from {}", file.display());

        let settings = Config::builder()
            .add_source(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(path.is_some()),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that could never produce a working pipeline
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model must not be empty"));
        }
        if self.llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens must be positive"));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(invalid("llm.temperature must be between 0 and 1"));
        }
        if self.store.backend == StoreBackend::Remote && self.store.url.is_none() {
            return Err(invalid("store.url is required for the remote backend"));
        }
        Ok(())
    }

    /// Completion client settings, resolving the API key from the environment
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self
                .llm
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .or_else(|| env::var("ANTHROPIC_API_KEY").ok())
                .unwrap_or_default(),
            model: self.llm.model.clone(),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
            endpoint: self.llm.endpoint.clone(),
        }
    }

    /// libSQL connection for persistent backends; `None` for `memory`
    ///
    /// `db_path` overrides the configured local path.
    pub fn connection_mode(&self, db_path: Option<PathBuf>) -> Option<ConnectionMode> {
        match self.store.backend {
            StoreBackend::Memory => None,
            StoreBackend::Local => {
                let path = db_path
                    .or_else(|| self.store.path.clone())
                    .unwrap_or_else(default_db_path);
                Some(ConnectionMode::Local(path.to_string_lossy().to_string()))
            }
            StoreBackend::Remote => Some(ConnectionMode::Remote {
                url: self.store.url.clone().unwrap_or_default(),
                token: self.store.token.clone().unwrap_or_default(),
            }),
        }
    }
}

fn invalid(message: &str) -> FeedbackError {
    FeedbackError::Config(::config::ConfigError::Message(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackend::Local);
        assert!(!config.llm.model.is_empty());
    }

    #[test]
    fn test_from_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [llm]
            model = "claude-3-5-sonnet-20241022"
            temperature = 0.0

            [store]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.connection_mode(None).is_none());
    }

    #[test]
    fn test_validation_errors() {
        let err = AppConfig::from_toml_str("[llm]\ntemperature = 1.5\n").unwrap_err();
        assert!(matches!(err, FeedbackError::Config(_)));

        let err = AppConfig::from_toml_str("[store]\nbackend = \"remote\"\n").unwrap_err();
        assert!(err.to_string().contains("store.url"));
    }

    #[test]
    fn test_db_path_override() {
        let config = AppConfig::default();
        match config.connection_mode(Some(PathBuf::from("/tmp/override.db"))) {
            Some(ConnectionMode::Local(path)) => assert_eq!(path, "/tmp/override.db"),
            other => panic!("unexpected mode: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_file_then_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[llm]\nmodel = \"from-file\"\nmax_tokens = 512").unwrap();

        env::set_var("INTERVIEW_FEEDBACK__LLM__MODEL", "from-env");
        let config = AppConfig::load(Some(file.path()));
        env::remove_var("INTERVIEW_FEEDBACK__LLM__MODEL");

        let config = config.unwrap();
        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.llm.max_tokens, 512);
    }

    #[test]
    #[serial]
    fn test_api_key_falls_back_to_env() {
        env::set_var("ANTHROPIC_API_KEY", "sk-ant-env");
        let from_env = AppConfig::default().llm_config().api_key;

        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-ant-file".to_string());
        let from_file = config.llm_config().api_key;
        env::remove_var("ANTHROPIC_API_KEY");

        assert_eq!(from_env, "sk-ant-env");
        assert_eq!(from_file, "sk-ant-file");
    }

    #[test]
    #[serial]
    fn test_missing_optional_file_is_fine() {
        let config = AppConfig::load(None).unwrap();
        assert!(config.validate().is_ok());
    }
}
