//! Per-alias capability schema cache.
//!
//! Each alias has one JSON file `{ "timestamp": <epoch seconds>, "tools": [...] }`
//! under the cache directory. A snapshot that is unreadable, malformed or
//! older than the TTL counts as a miss and is deleted on the failed load.
//! Writes replace the whole file, so readers never see a partial snapshot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Capability, validate_alias};
use crate::fs::write_atomic;

/// How long a snapshot stays fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors from writing a snapshot.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cannot cache tools for alias '{alias}': {reason}")]
    InvalidAlias { alias: String, reason: String },

    #[error("Failed to write schema cache {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// On-disk layout of one snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    timestamp: f64,
    tools: Vec<Capability>,
}

/// A capability list captured from one server at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilitySnapshot {
    pub alias: String,
    pub capabilities: Vec<Capability>,
    pub captured_at: DateTime<Utc>,
}

/// File-backed schema cache.
#[derive(Debug, Clone)]
pub struct SchemaCache {
    dir: PathBuf,
}

#[allow(clippy::cast_precision_loss)]
fn now_epoch_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

impl SchemaCache {
    /// Create a cache rooted at `dir` with the default TTL.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the snapshot for `alias`.
    pub fn path_for(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{alias}.json"))
    }

    /// Load the cached capabilities for `alias`, if fresh.
    pub fn load(&self, alias: &str) -> Option<Vec<Capability>> {
        self.load_snapshot(alias).map(|snapshot| snapshot.capabilities)
    }

    /// Load the full snapshot for `alias`, if fresh.
    pub fn load_snapshot(&self, alias: &str) -> Option<CapabilitySnapshot> {
        self.load_snapshot_at(alias, now_epoch_secs())
    }

    fn load_snapshot_at(&self, alias: &str, now: f64) -> Option<CapabilitySnapshot> {
        if validate_alias(alias).is_err() {
            return None;
        }

        let path = self.path_for(alias);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!(alias, error = %e, "Unreadable schema cache, discarding");
                remove_quietly(&path);
                return None;
            }
        };

        let file: CacheFile = match serde_json::from_str(&raw) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(alias, error = %e, "Malformed schema cache, discarding");
                remove_quietly(&path);
                return None;
            }
        };

        let age = now - file.timestamp;
        if !age.is_finite() || age.abs() > CACHE_TTL.as_secs_f64() {
            tracing::debug!(alias, age_secs = age, "Stale schema cache, discarding");
            remove_quietly(&path);
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let captured_at = DateTime::from_timestamp_millis((file.timestamp * 1000.0) as i64)
            .unwrap_or_default();

        Some(CapabilitySnapshot {
            alias: alias.to_string(),
            capabilities: file.tools,
            captured_at,
        })
    }

    /// Replace the snapshot for `alias`.
    pub fn save(&self, alias: &str, capabilities: &[Capability]) -> Result<(), CacheError> {
        self.save_at(alias, capabilities, now_epoch_secs())
    }

    fn save_at(&self, alias: &str, capabilities: &[Capability], now: f64) -> Result<(), CacheError> {
        validate_alias(alias).map_err(|reason| CacheError::InvalidAlias {
            alias: alias.to_string(),
            reason,
        })?;

        let path = self.path_for(alias);
        let file = CacheFile {
            timestamp: now,
            tools: capabilities.to_vec(),
        };
        let write_err = |reason: String| CacheError::Write {
            path: path.clone(),
            reason,
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| write_err(e.to_string()))?;
        write_atomic(&path, json.as_bytes()).map_err(|e| write_err(e.to_string()))?;

        tracing::debug!(alias, tools = capabilities.len(), "Schema cache updated");
        Ok(())
    }

    /// Drop the snapshot for `alias`. Safe to call when none exists.
    pub fn invalidate(&self, alias: &str) {
        if validate_alias(alias).is_ok() {
            remove_quietly(&self.path_for(alias));
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }
}
