//! Core domain types and storage for mcpx.
//!
//! This crate has no knowledge of processes or networking. It owns:
//! - Server definitions, capabilities and install specs (`domain`)
//! - Path resolution for the configuration directory (`paths`)
//! - The JSON configuration store (`config`)
//! - Environment merging for server launches (`environment`)
//! - The per-alias capability schema cache (`cache`)
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod domain;
pub mod environment;
pub(crate) mod fs;
pub mod paths;

pub use cache::{CACHE_TTL, CacheError, CapabilitySnapshot, SchemaCache};
pub use config::{AppConfig, ConfigError, ConfigStore, LlmConfig};
pub use domain::{
    ALLOWED_LAUNCHERS, Capability, DEFAULT_TIMEOUT_SECS, InstallSpec, InstallSpecError,
    RESERVED_NAMES, ServerConfig, ServerDefinition, unique_by_name, validate_alias,
};
pub use environment::{EnvError, mask_env, resolve_env, resolve_env_in};
pub use paths::{PathError, ResolvedPaths};
