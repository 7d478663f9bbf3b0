//! JSON configuration store.
//!
//! The configuration document maps aliases to server launch configurations
//! and carries the model settings used by `install`. Every mutation rewrites
//! the whole file atomically; concurrent writers resolve as last-writer-wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DEFAULT_TIMEOUT_SECS, ServerConfig, ServerDefinition, validate_alias};
use crate::fs::write_atomic;

/// Errors that can occur while reading or writing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Config file {path} is not valid: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to write config {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Invalid alias: {0}")]
    InvalidAlias(String),

    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),
}

/// Settings for the model endpoint used by `install`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name sent with every completion request.
    pub model: String,

    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "LlmConfig::default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "LlmConfig::default_api_key_env")]
    pub api_key_env: String,
}

impl LlmConfig {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";

    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn default_api_key_env() -> String {
        "OPENAI_API_KEY".to_string()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::default_base_url(),
            api_key_env: Self::default_api_key_env(),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_global_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// The full configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configured servers keyed by alias.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,

    /// Timeout applied to servers added without an explicit one.
    #[serde(default = "default_global_timeout")]
    pub global_timeout: u64,

    /// Whether discovered tool schemas are cached on disk.
    #[serde(default = "default_true")]
    pub cache_schemas: bool,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            servers: BTreeMap::new(),
            global_timeout: DEFAULT_TIMEOUT_SECS,
            cache_schemas: true,
            llm: LlmConfig::default(),
        }
    }
}

/// File-backed configuration store.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigStore {
    /// Open the store at `path`. A missing file yields the default config.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = Self::load(&path)?;
        Ok(Self { path, config })
    }

    fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn save(&self) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::Write {
            path: self.path.clone(),
            reason,
        };
        let json = serde_json::to_string_pretty(&self.config).map_err(|e| write_err(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes()).map_err(|e| write_err(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded configuration document.
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Look up a server by alias.
    pub fn get_server(&self, alias: &str) -> Option<ServerDefinition> {
        self.config
            .servers
            .get(alias)
            .map(|config| ServerDefinition::new(alias, config.clone()))
    }

    /// All servers, ordered by alias.
    pub fn list_servers(&self) -> Vec<ServerDefinition> {
        self.config
            .servers
            .iter()
            .map(|(alias, config)| ServerDefinition::new(alias.clone(), config.clone()))
            .collect()
    }

    /// Insert or replace a server definition.
    pub fn add_server(&mut self, alias: &str, server: ServerConfig) -> Result<(), ConfigError> {
        validate_alias(alias).map_err(ConfigError::InvalidAlias)?;
        server.validate().map_err(ConfigError::InvalidServer)?;
        self.config.servers.insert(alias.to_string(), server);
        self.save()
    }

    /// Remove a server. Returns `false` if the alias was not configured.
    pub fn remove_server(&mut self, alias: &str) -> Result<bool, ConfigError> {
        if self.config.servers.remove(alias).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Replace the model settings.
    pub fn set_llm(&mut self, llm: LlmConfig) -> Result<(), ConfigError> {
        self.config.llm = llm;
        self.save()
    }
}
