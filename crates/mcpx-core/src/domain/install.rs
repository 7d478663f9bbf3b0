//! Install specification produced by the auto-install agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::server::ServerConfig;

/// The only launchers an install spec may use.
pub const ALLOWED_LAUNCHERS: [&str; 2] = ["npx", "uvx"];

/// Errors raised when a terminal `install_server` payload is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallSpecError {
    #[error("Invalid command {command:?}. Allowed: npx, uvx")]
    DisallowedCommand { command: String },

    #[error("Install spec is missing an alias")]
    MissingAlias,

    #[error("Malformed install spec: {0}")]
    Malformed(String),
}

/// A validated description of how to launch a discovered server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSpec {
    pub alias: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Names of required environment variables (never values).
    #[serde(default)]
    pub env_vars: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl InstallSpec {
    /// Build a spec from raw tool-call arguments.
    ///
    /// The launcher allowlist is checked before anything else so a
    /// disallowed command is reported as such even if other fields are bad.
    pub fn from_tool_arguments(arguments: Value) -> Result<Self, InstallSpecError> {
        let command = arguments
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !ALLOWED_LAUNCHERS.contains(&command) {
            return Err(InstallSpecError::DisallowedCommand {
                command: command.to_string(),
            });
        }

        let mut spec: Self = serde_json::from_value(arguments)
            .map_err(|e| InstallSpecError::Malformed(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        spec.env_vars.retain(|name| seen.insert(name.clone()));

        spec.validate()?;
        Ok(spec)
    }

    /// Re-check invariants, e.g. after the alias was overridden.
    pub fn validate(&self) -> Result<(), InstallSpecError> {
        if !ALLOWED_LAUNCHERS.contains(&self.command.as_str()) {
            return Err(InstallSpecError::DisallowedCommand {
                command: self.command.clone(),
            });
        }
        if self.alias.trim().is_empty() {
            return Err(InstallSpecError::MissingAlias);
        }
        Ok(())
    }

    /// Launch configuration for this spec. Env values are filled in by the caller.
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig::new(self.command.clone(), self.args.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_npx_and_uvx() {
        let spec = InstallSpec::from_tool_arguments(json!({
            "alias": "time",
            "command": "uvx",
            "args": ["mcp-server-time"],
        }))
        .unwrap();
        assert_eq!(spec.command, "uvx");
        assert_eq!(spec.args, vec!["mcp-server-time"]);
        assert!(spec.env_vars.is_empty());
        assert_eq!(spec.notes, "");

        let spec = InstallSpec::from_tool_arguments(json!({
            "alias": "gh",
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-github"],
            "env_vars": ["GITHUB_TOKEN", "GITHUB_TOKEN"],
        }))
        .unwrap();
        assert_eq!(spec.env_vars, vec!["GITHUB_TOKEN"]);
    }

    #[test]
    fn test_rejects_other_launchers() {
        for command in ["node", "python", "/usr/bin/npx", "bash"] {
            let err = InstallSpec::from_tool_arguments(json!({
                "alias": "x",
                "command": command,
                "args": [],
            }))
            .unwrap_err();
            assert_eq!(
                err,
                InstallSpecError::DisallowedCommand {
                    command: command.to_string()
                }
            );
        }
    }

    #[test]
    fn test_rejects_missing_command() {
        let err = InstallSpec::from_tool_arguments(json!({ "alias": "x" })).unwrap_err();
        assert!(matches!(err, InstallSpecError::DisallowedCommand { .. }));
    }

    #[test]
    fn test_rejects_malformed_fields() {
        let err = InstallSpec::from_tool_arguments(json!({
            "alias": "x",
            "command": "npx",
            "args": "not-a-list",
        }))
        .unwrap_err();
        assert!(matches!(err, InstallSpecError::Malformed(_)));
    }

    #[test]
    fn test_rejects_blank_alias() {
        let err = InstallSpec::from_tool_arguments(json!({
            "alias": " ",
            "command": "npx",
        }))
        .unwrap_err();
        assert_eq!(err, InstallSpecError::MissingAlias);
    }
}
