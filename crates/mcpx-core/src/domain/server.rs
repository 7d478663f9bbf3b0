//! Server definition domain types.
//!
//! A server is identified by a user-chosen alias and launched from a
//! command line plus environment. Definitions are read-only to everything
//! except the configuration store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Handshake deadline used when a definition does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level command names that can never be used as a server alias.
pub const RESERVED_NAMES: &[&str] = &["add", "list", "remove", "config-llm", "install", "help"];

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Launch configuration for a stdio server, as persisted in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Executable to spawn (resolved through PATH).
    pub command: String,

    /// Arguments passed to the executable, in order.
    #[serde(default)]
    pub args: Vec<String>,

    /// Inline environment variables. These win over any env file.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Optional dotenv file merged underneath the inline variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<String>,

    /// Handshake deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl ServerConfig {
    /// Create a configuration with no environment and the default timeout.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
            env_file: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Add an inline environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the handshake timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the env file reference.
    #[must_use]
    pub fn with_env_file(mut self, path: impl Into<String>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Validate the launch fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.command.trim().is_empty() {
            return Err("Server command cannot be empty".to_string());
        }
        if self.timeout == 0 {
            return Err("Server timeout must be at least 1 second".to_string());
        }
        Ok(())
    }
}

/// A configured server: its alias plus launch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDefinition {
    /// Unique, user-chosen name. Also the CLI group name.
    pub alias: String,

    /// How to launch the server.
    #[serde(flatten)]
    pub config: ServerConfig,
}

impl ServerDefinition {
    pub fn new(alias: impl Into<String>, config: ServerConfig) -> Self {
        Self {
            alias: alias.into(),
            config,
        }
    }

    /// The full command line, used in error messages and debug output.
    pub fn command_line(&self) -> String {
        if self.config.args.is_empty() {
            self.config.command.clone()
        } else {
            format!("{} {}", self.config.command, self.config.args.join(" "))
        }
    }
}

/// Validate a server alias.
///
/// Aliases double as CLI command names and cache file names, so they must be
/// non-empty, limited to `[A-Za-z0-9._-]`, must not start with `.` or `-`, and
/// must not shadow a built-in command.
pub fn validate_alias(alias: &str) -> Result<(), String> {
    if alias.is_empty() {
        return Err("Alias cannot be empty".to_string());
    }

    if alias.starts_with('.') || alias.starts_with('-') {
        return Err(format!("Alias cannot start with '.' or '-': {alias}"));
    }

    if let Some(bad) = alias
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("Alias contains invalid character {bad:?}: {alias}"));
    }

    if RESERVED_NAMES.contains(&alias) {
        return Err(format!("Alias '{alias}' is reserved for a built-in command"));
    }

    Ok(())
}
