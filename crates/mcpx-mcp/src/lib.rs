//! MCP stdio session transport for mcpx.
//!
//! Spawns a tool server, performs the JSON-RPC handshake, lists and invokes
//! capabilities, and tears the child down again. Also home to the
//! [`ToolBackend`] port that the CLI depends on.
#![deny(unsafe_code)]

mod backend;
mod cancel;
mod error;
pub mod protocol;
mod session;
pub mod shutdown;
pub mod stderr_filter;

#[cfg(any(test, feature = "test-utils"))]
pub use backend::MockToolBackend;
pub use backend::{StdioBackend, ToolBackend};
pub use cancel::{SignalGuard, run_cancellable};
pub use error::{METHOD_NOT_FOUND, SessionError};
pub use protocol::{CallResult, ServerInfo};
pub use session::{McpSession, SessionState};
pub use stderr_filter::FilteredStderr;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;
