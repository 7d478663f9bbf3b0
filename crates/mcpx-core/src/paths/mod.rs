//! Path resolution for the mcpx configuration directory.
//!
//! Resolution order for the configuration directory:
//! 1. `MCPX_CONFIG_DIR` environment variable (highest priority)
//! 2. `~/.config/mcpx`
//!
//! The config file and schema cache live underneath it.

mod env;
mod error;

use std::path::PathBuf;

pub use env::{EnvProvider, SystemEnv};
pub use error::PathError;

/// Environment variable that overrides the configuration directory.
pub const CONFIG_DIR_ENV: &str = "MCPX_CONFIG_DIR";

/// Resolve the configuration directory from the process environment.
pub fn config_dir() -> Result<PathBuf, PathError> {
    config_dir_with(&SystemEnv)
}

/// Resolve the configuration directory from an injectable environment.
pub fn config_dir_with(env: &dyn EnvProvider) -> Result<PathBuf, PathError> {
    if let Some(dir) = env.get(CONFIG_DIR_ENV) {
        if dir.is_empty() {
            return Err(PathError::EmptyPath);
        }
        return Ok(PathBuf::from(dir));
    }

    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(".config").join("mcpx"))
}

/// All resolved paths captured in a single struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Root configuration directory.
    pub config_dir: PathBuf,
    /// The JSON configuration document.
    pub config_file: PathBuf,
    /// Directory holding one schema snapshot per alias.
    pub cache_dir: PathBuf,
}

impl ResolvedPaths {
    /// Resolve all paths using the current environment.
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self::from_config_dir(config_dir()?))
    }

    /// Derive every path from an explicit configuration directory.
    pub fn from_config_dir(config_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join("config.json"),
            cache_dir: config_dir.join("cache"),
            config_dir,
        }
    }
}

impl std::fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Config dir:  {}", self.config_dir.display())?;
        writeln!(f, "Config file: {}", self.config_file.display())?;
        write!(f, "Cache dir:   {}", self.cache_dir.display())
    }
}
