//! Session error taxonomy.

use mcpx_core::EnvError;
use thiserror::Error;

/// JSON-RPC error code for an unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Errors that can occur while talking to a tool server.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The child process could not be spawned.
    #[error("Failed to start server: {command_line}\n{cause}")]
    StartupFailed { command_line: String, cause: String },

    /// The server did not finish the handshake within its deadline.
    #[error("Server did not respond within {timeout_secs}s timeout.")]
    HandshakeTimeout { timeout_secs: u64 },

    /// The handshake completed with an error.
    #[error("Server connection failed: {reason}")]
    HandshakeFailed { reason: String },

    /// The server does not know the requested method (or tool).
    #[error("{message}")]
    MethodNotFound { message: String },

    /// Any other JSON-RPC error response.
    #[error("Server returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server closed the connection")]
    ConnectionClosed,

    #[error("Session is not ready")]
    NotReady,

    /// A termination signal arrived while an operation was in flight.
    #[error("Interrupted.")]
    Interrupted,

    #[error(transparent)]
    Environment(#[from] EnvError),

    #[error("I/O error talking to server: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Classify a JSON-RPC error object.
    ///
    /// The code decides; the message is only consulted for servers that
    /// report unknown methods under a different code.
    pub fn from_rpc(code: i64, message: String) -> Self {
        if code == METHOD_NOT_FOUND || message.to_lowercase().contains("method not found") {
            let message = if message.is_empty() {
                "Method not found".to_string()
            } else {
                message
            };
            Self::MethodNotFound { message }
        } else {
            Self::Rpc { code, message }
        }
    }

    pub const fn is_method_not_found(&self) -> bool {
        matches!(self, Self::MethodNotFound { .. })
    }

    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}
