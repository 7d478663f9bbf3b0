//! Domain types shared by every mcpx crate.

mod capability;
mod install;
mod server;

pub use capability::{Capability, unique_by_name};
pub use install::{ALLOWED_LAUNCHERS, InstallSpec, InstallSpecError};
pub use server::{
    DEFAULT_TIMEOUT_SECS, RESERVED_NAMES, ServerConfig, ServerDefinition, validate_alias,
};
