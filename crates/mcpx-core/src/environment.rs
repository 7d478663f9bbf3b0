//! Environment merging for server launches.
//!
//! Precedence, lowest to highest:
//! 1. The server's configured `env_file`
//! 2. A `.env` file in the current working directory
//! 3. Inline `env` entries from the server definition
//!
//! The result is layered on top of the parent process environment by the
//! session transport.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::ServerConfig;

/// Errors from reading dotenv files.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Failed to parse env file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Merge the env layers for a server using `./.env` as the local file.
pub fn resolve_env(config: &ServerConfig) -> Result<BTreeMap<String, String>, EnvError> {
    resolve_env_in(config, Path::new(".env"))
}

/// Merge the env layers for a server with an explicit local dotenv path.
pub fn resolve_env_in(
    config: &ServerConfig,
    local_env: &Path,
) -> Result<BTreeMap<String, String>, EnvError> {
    let mut env = BTreeMap::new();

    if let Some(ref env_file) = config.env_file {
        let path = Path::new(env_file);
        if path.exists() {
            load_dotenv(path, &mut env)?;
        } else {
            tracing::warn!(path = %env_file, "Configured env file does not exist, skipping");
        }
    }

    if local_env.exists() {
        load_dotenv(local_env, &mut env)?;
    }

    env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(env)
}

fn load_dotenv(path: &Path, into: &mut BTreeMap<String, String>) -> Result<(), EnvError> {
    let parse_err = |reason: String| EnvError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let iter = dotenvy::from_path_iter(path).map_err(|e| parse_err(e.to_string()))?;
    for item in iter {
        let (key, value) = item.map_err(|e| parse_err(e.to_string()))?;
        into.insert(key, value);
    }
    Ok(())
}

/// Replace every value with `***` for debug output.
pub fn mask_env(env: &BTreeMap<String, String>) -> BTreeMap<String, &'static str> {
    env.keys().map(|k| (k.clone(), "***")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_inline_env_wins_over_files() {
        let temp = tempdir().unwrap();
        let env_file = temp.path().join("server.env");
        let local = temp.path().join(".env");
        fs::write(&env_file, "A=from_file\nB=from_file\nC=from_file\n").unwrap();
        fs::write(&local, "B=from_local\nC=from_local\n").unwrap();

        let config = ServerConfig::new("npx", vec![])
            .with_env_file(env_file.to_string_lossy())
            .with_env("C", "inline");

        let env = resolve_env_in(&config, &local).unwrap();
        assert_eq!(env["A"], "from_file");
        assert_eq!(env["B"], "from_local");
        assert_eq!(env["C"], "inline");
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let temp = tempdir().unwrap();
        let config = ServerConfig::new("npx", vec![])
            .with_env_file(temp.path().join("nope.env").to_string_lossy())
            .with_env("ONLY", "1");
        let env = resolve_env_in(&config, &temp.path().join(".env")).unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env["ONLY"], "1");
    }

    #[test]
    fn test_mask_env_hides_values() {
        let mut env = BTreeMap::new();
        env.insert("TOKEN".to_string(), "secret".to_string());
        let masked = mask_env(&env);
        assert_eq!(masked["TOKEN"], "***");
    }
}
