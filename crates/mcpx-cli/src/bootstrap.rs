//! CLI bootstrap: the composition root.
//!
//! This is the only place where the configuration store, schema cache and
//! tool backend are instantiated. Handlers receive a [`CliContext`].

use std::sync::Arc;

use mcpx_agent::RegistryConfig;
use mcpx_core::{ConfigStore, ResolvedPaths, SchemaCache};
use mcpx_mcp::{StdioBackend, ToolBackend};

use crate::error::CliError;

/// Everything a command needs for one invocation.
pub struct CliContext {
    pub store: ConfigStore,
    pub cache: SchemaCache,
    pub backend: Arc<dyn ToolBackend>,
    pub registry: RegistryConfig,
}

impl CliContext {
    /// Compose a context from explicit parts.
    pub fn new(store: ConfigStore, cache: SchemaCache, backend: Arc<dyn ToolBackend>) -> Self {
        Self {
            store,
            cache,
            backend,
            registry: RegistryConfig::default(),
        }
    }

    /// Open the store and cache under `paths`, talking to real servers.
    pub fn open(paths: &ResolvedPaths) -> Result<Self, CliError> {
        let store = ConfigStore::open(&paths.config_file)?;
        let cache = SchemaCache::new(&paths.cache_dir);
        tracing::debug!(
            config = %store.path().display(),
            servers = store.config().servers.len(),
            "Loaded configuration"
        );
        Ok(Self::new(store, cache, Arc::new(StdioBackend::new())))
    }

    /// Whether schema snapshots are read and written for this run.
    pub fn cache_enabled(&self) -> bool {
        self.store.config().cache_schemas
    }

    /// Whether `name` is a configured server alias.
    pub fn is_alias(&self, name: &str) -> bool {
        self.store.config().servers.contains_key(name)
    }
}

impl std::fmt::Debug for CliContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliContext")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Bootstrap the CLI from the process environment.
pub fn bootstrap() -> Result<CliContext, CliError> {
    let paths = ResolvedPaths::resolve()?;
    tracing::debug!(config = %paths.config_file.display(), "Resolved configuration paths");
    CliContext::open(&paths)
}
