//! The port the CLI uses to reach tool servers.

use async_trait::async_trait;
use mcpx_core::{Capability, ServerDefinition, resolve_env};
use serde_json::{Map, Value};

use crate::cancel::{SignalGuard, run_cancellable};
use crate::error::SessionError;
use crate::protocol::CallResult;
use crate::session::McpSession;

/// Runs one operation against a configured server.
///
/// Each call is a full open/operate/close cycle; nothing is kept between
/// calls.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Discover the server's capabilities.
    async fn list_capabilities(
        &self,
        server: &ServerDefinition,
    ) -> Result<Vec<Capability>, SessionError>;

    /// Invoke one capability with an already validated argument object.
    async fn call(
        &self,
        server: &ServerDefinition,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallResult, SessionError>;
}

/// Production backend: spawns the server over stdio for every operation.
///
/// SIGINT/SIGTERM during an operation interrupt it. The session is closed
/// before the signal guard is released, so the child never outlives the
/// invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioBackend;

impl StdioBackend {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolBackend for StdioBackend {
    async fn list_capabilities(
        &self,
        server: &ServerDefinition,
    ) -> Result<Vec<Capability>, SessionError> {
        let env = resolve_env(&server.config)?;
        let guard = SignalGuard::install()?;
        let token = guard.token();

        let mut session = run_cancellable(&token, McpSession::open(server, &env)).await?;
        let result = run_cancellable(&token, session.list_capabilities()).await;
        session.close().await;
        drop(guard);
        result
    }

    async fn call(
        &self,
        server: &ServerDefinition,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallResult, SessionError> {
        let env = resolve_env(&server.config)?;
        let guard = SignalGuard::install()?;
        let token = guard.token();

        let mut session = run_cancellable(&token, McpSession::open(server, &env)).await?;
        let result = run_cancellable(&token, session.invoke(name, arguments)).await;
        session.close().await;
        drop(guard);
        result
    }
}
