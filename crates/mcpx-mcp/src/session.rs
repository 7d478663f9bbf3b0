//! One MCP session over a child process's stdio.
//!
//! A session is opened for a single CLI invocation, used for one operation
//! and closed again. It is never shared across invocations or tasks.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use mcpx_core::{Capability, ServerDefinition, unique_by_name};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{METHOD_NOT_FOUND, SessionError};
use crate::protocol::{
    self, CallResult, Incoming, InitializeResult, JsonRpcRequest, ListToolsPage, ServerInfo,
};
use crate::shutdown::{GRACE_PERIOD, terminate_child};
use crate::stderr_filter::spawn_stderr_forwarder;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Handshaking,
    Ready,
    Closed,
    Failed,
}

/// Live connection to one tool server.
#[derive(Debug)]
pub struct McpSession {
    alias: String,
    state: SessionState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<()>>,
    next_id: u64,
    server_info: Option<ServerInfo>,
}

impl McpSession {
    /// Spawn the server and complete the MCP handshake.
    ///
    /// `env` is layered over the parent environment. The handshake is bounded
    /// by the definition's timeout; on any failure the child is torn down
    /// before the error is returned.
    pub async fn open(
        definition: &ServerDefinition,
        env: &BTreeMap<String, String>,
    ) -> Result<Self, SessionError> {
        let config = &definition.config;
        debug!(alias = %definition.alias, command = %definition.command_line(), "Starting server");

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::StartupFailed {
                command_line: definition.command_line(),
                cause: e.to_string(),
            })?;

        let missing_pipe = |name: &str| SessionError::StartupFailed {
            command_line: definition.command_line(),
            cause: format!("Failed to capture {name}"),
        };
        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr_task = child.stderr.take().map(spawn_stderr_forwarder);

        let mut session = Self {
            alias: definition.alias.clone(),
            state: SessionState::Uninitialized,
            child: Some(child),
            stdin: Some(stdin),
            stdout: Some(BufReader::new(stdout)),
            stderr_task,
            next_id: 1,
            server_info: None,
        };

        session.state = SessionState::Handshaking;
        let deadline = Duration::from_secs(config.timeout);
        let outcome = match timeout(deadline, session.handshake()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::HandshakeFailed {
                reason: e.to_string(),
            }),
            Err(_) => Err(SessionError::HandshakeTimeout {
                timeout_secs: config.timeout,
            }),
        };

        match outcome {
            Ok(()) => {
                session.state = SessionState::Ready;
                Ok(session)
            }
            Err(e) => {
                session.teardown().await;
                session.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    async fn handshake(&mut self) -> Result<(), SessionError> {
        let result = self
            .request("initialize", Some(protocol::initialize_params()))
            .await?;
        let init: InitializeResult = serde_json::from_value(result)?;
        debug!(
            alias = %self.alias,
            server = %init.server_info.name,
            protocol = %init.protocol_version,
            "Handshake complete"
        );
        self.server_info = Some(init.server_info);
        self.send(&protocol::notification("notifications/initialized"))
            .await
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Process id of the server while it is running.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// List every capability, following pagination until exhausted.
    pub async fn list_capabilities(&mut self) -> Result<Vec<Capability>, SessionError> {
        self.ensure_ready()?;

        let mut capabilities = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self.request("tools/list", params).await?;
            let page: ListToolsPage = serde_json::from_value(result)?;
            capabilities.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        warn!(alias = %self.alias, cursor = %next, "Server repeated a page cursor, stopping");
                        break;
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        debug!(alias = %self.alias, count = capabilities.len(), "Listed capabilities");
        Ok(unique_by_name(capabilities))
    }

    /// Call one capability.
    pub async fn invoke(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallResult, SessionError> {
        self.ensure_ready()?;
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Tear down the child and pipes. Idempotent and infallible.
    pub async fn close(&mut self) {
        if matches!(self.state, SessionState::Closed | SessionState::Failed) {
            return;
        }
        self.teardown().await;
        self.state = SessionState::Closed;
    }

    async fn teardown(&mut self) {
        // EOF on stdin is the polite shutdown request
        self.stdin = None;
        self.stdout = None;

        if let Some(mut child) = self.child.take() {
            match terminate_child(&mut child, GRACE_PERIOD).await {
                Ok(status) => debug!(alias = %self.alias, %status, "Server exited"),
                Err(e) => debug!(alias = %self.alias, error = %e, "Server teardown failed"),
            }
        }

        // Let the forwarder drain what the server printed on its way out
        if let Some(mut task) = self.stderr_task.take() {
            if timeout(Duration::from_millis(500), &mut task).await.is_err() {
                debug!(alias = %self.alias, "stderr forwarder still running, aborting");
                task.abort();
            }
        }
    }

    const fn ensure_ready(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => Ok(()),
            _ => Err(SessionError::NotReady),
        }
    }

    async fn send(&mut self, message: &Value) -> Result<(), SessionError> {
        let stdin = self.stdin.as_mut().ok_or(SessionError::ConnectionClosed)?;
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        stdin.write_all(&line).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Send a request and read until its response arrives.
    ///
    /// Server pings are answered, other server requests are refused with
    /// method-not-found, notifications and non-JSON lines are skipped.
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, SessionError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = serde_json::to_value(JsonRpcRequest::new(id, method, params))?;
        debug!(alias = %self.alias, id, method, "Sending request");
        self.send(&request).await?;

        let mut buf = Vec::with_capacity(4096);
        loop {
            buf.clear();
            let stdout = self.stdout.as_mut().ok_or(SessionError::ConnectionClosed)?;
            if stdout.read_until(b'\n', &mut buf).await? == 0 {
                return Err(SessionError::ConnectionClosed);
            }

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match Incoming::parse(line) {
                Some(Incoming::Response { id: reply_id, outcome }) => {
                    if reply_id.as_ref().and_then(Value::as_u64) != Some(id) {
                        debug!(alias = %self.alias, ?reply_id, "Ignoring response to another request");
                        continue;
                    }
                    return outcome.map_err(|err| SessionError::from_rpc(err.code, err.message));
                }
                Some(Incoming::Request { id: server_id, method }) => {
                    let reply = if method == "ping" {
                        protocol::empty_result(&server_id)
                    } else {
                        debug!(alias = %self.alias, %method, "Refusing server request");
                        protocol::error_reply(&server_id, METHOD_NOT_FOUND, "Method not found")
                    };
                    self.send(&reply).await?;
                }
                Some(Incoming::Notification { method }) => {
                    debug!(alias = %self.alias, %method, "Server notification");
                }
                None => {
                    debug!(
                        alias = %self.alias,
                        line = %String::from_utf8_lossy(line),
                        "Skipping non-JSON-RPC output"
                    );
                }
            }
        }
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        // kill_on_drop covers the child; the forwarder ends with its pipe
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}
