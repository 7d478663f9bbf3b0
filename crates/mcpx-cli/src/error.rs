//! CLI error type and exit code mapping.

use mcpx_agent::AgentError;
use mcpx_core::{CacheError, ConfigError, EnvError, PathError};
use mcpx_mcp::SessionError;
use thiserror::Error;

/// Exit code for a run cut short by SIGINT/SIGTERM.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Errors surfaced to the user by the `mcpx` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Command-line parsing failed (or help/version was requested).
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// Arguments failed the tool's input schema.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Paths(#[from] PathError),

    #[error(transparent)]
    Environment(#[from] EnvError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Map error to the process exit code.
    ///
    /// - 1: general failure (connection, validation, configuration)
    /// - 2: usage error (reported by clap)
    /// - 130: interrupted
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(err) => err.exit_code(),
            Self::Session(err) if err.is_interrupted() => EXIT_INTERRUPTED,
            _ => 1,
        }
    }

    /// Whether this is an interruption rather than a failure.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Session(err) if err.is_interrupted())
    }
}
