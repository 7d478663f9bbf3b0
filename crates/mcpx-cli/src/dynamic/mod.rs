//! Runtime command tree built from discovered capabilities.
//!
//! - `schema`: input schema to flag specifications
//! - `command`: one clap subcommand per capability
//! - `group`: one command group per server alias, cache-backed

pub mod command;
pub mod group;
pub mod schema;

pub use command::{InvocationMode, ToolCommand};
pub use group::{CapabilityGroup, load_group};
pub use schema::{ParamKind, ParameterSpec, RESERVED_FLAGS, derive_parameters, validate_arguments};
