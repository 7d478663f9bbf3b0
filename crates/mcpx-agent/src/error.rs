//! Agent and model error types.

use thiserror::Error;

/// Errors from the model endpoint.
#[derive(Debug, Error)]
pub enum ModelError {
    /// TCP/HTTP connection to the model endpoint failed.
    #[error("Connection to model endpoint {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Non-2xx response from the model endpoint.
    #[error("Model endpoint returned HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body did not match the chat completions shape.
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Invalid model configuration: {0}")]
    Config(String),
}

/// Errors that abort the agent loop.
///
/// Tool failures never appear here; they are fed back to the model as
/// tool results.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Failed to prepare agent tools: {0}")]
    Setup(String),

    #[error("Model proposed an invalid server: {0}")]
    InvalidInstall(#[from] mcpx_core::InstallSpecError),
}
