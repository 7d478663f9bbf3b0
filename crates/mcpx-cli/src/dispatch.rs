//! Tool invocation for `mcpx <alias> <tool> [flags]`.
//!
//! Writers are passed in so output can be captured; the binary hands in
//! stdout and stderr. Nothing reaches a server before the arguments have
//! been parsed and validated.

use std::io::Write;

use mcpx_core::{ServerDefinition, mask_env, resolve_env};
use mcpx_mcp::CallResult;
use serde_json::{Map, Value, json};

use crate::bootstrap::CliContext;
use crate::dynamic::{CapabilityGroup, InvocationMode, ToolCommand, load_group, validate_arguments};
use crate::error::CliError;
use crate::presentation::truncate_string;

/// Result of a completed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The tool ran but reported `isError`.
    ToolError,
}

impl Outcome {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ToolError => 1,
        }
    }
}

/// Handle `argv` (starting with the alias) for a configured server.
pub async fn run_alias<O: Write, E: Write>(
    ctx: &CliContext,
    server: &ServerDefinition,
    argv: &[String],
    refresh: bool,
    out: &mut O,
    err: &mut E,
) -> Result<Outcome, CliError> {
    let group = load_group(ctx, server, refresh).await?;
    let matches = group.to_command().try_get_matches_from(argv)?;

    let Some((name, sub)) = matches.subcommand() else {
        write_tool_table(&group, err)?;
        return Ok(Outcome::Success);
    };
    let Some(tool) = group.resolve(name) else {
        return Err(CliError::Other(anyhow::anyhow!("Unknown tool: {name}")));
    };

    let arguments = tool.arguments(sub);
    validate_arguments(&tool.capability().input_schema, &arguments).map_err(CliError::Validation)?;

    let mode = ToolCommand::mode(sub);
    invoke(ctx, server, &tool, arguments, mode, ToolCommand::json_output(sub), out, err).await
}

/// Carry out one validated call in the given mode.
#[allow(clippy::too_many_arguments)]
pub async fn invoke<O: Write, E: Write>(
    ctx: &CliContext,
    server: &ServerDefinition,
    tool: &ToolCommand,
    arguments: Map<String, Value>,
    mode: InvocationMode,
    json_output: bool,
    out: &mut O,
    err: &mut E,
) -> Result<Outcome, CliError> {
    let name = tool.capability().name.as_str();

    if mode == InvocationMode::DryRun {
        let request = json!({ "tool": name, "arguments": arguments });
        writeln!(err, "{}", pretty(&request))?;
        return Ok(Outcome::Success);
    }

    if mode == InvocationMode::Debug {
        let env = resolve_env(&server.config)?;
        writeln!(err, "Server: {}", server.command_line())?;
        writeln!(err, "Env: {}", json!(mask_env(&env)))?;
        writeln!(
            err,
            "Request: {}",
            json!({ "method": "tools/call", "params": { "name": name, "arguments": arguments } })
        )?;
    }

    let result = match ctx.backend.call(server, name, arguments).await {
        Ok(result) => result,
        Err(e) => {
            if e.is_method_not_found() {
                tracing::debug!(alias = %server.alias, tool = name, "Tool unknown to server, dropping cached schemas");
                ctx.cache.invalidate(&server.alias);
            }
            return Err(e.into());
        }
    };

    if mode == InvocationMode::Debug {
        writeln!(
            err,
            "Response: isError={}, content_count={}",
            result.is_error,
            result.content.len()
        )?;
    }

    write_result(&result, json_output, out)?;
    Ok(if result.is_error {
        Outcome::ToolError
    } else {
        Outcome::Success
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Print a call result: text blocks raw, anything else as JSON.
pub fn write_result<O: Write>(result: &CallResult, json_output: bool, out: &mut O) -> std::io::Result<()> {
    if json_output {
        let envelope = serde_json::to_value(result).unwrap_or(Value::Null);
        return writeln!(out, "{}", pretty(&envelope));
    }

    for block in &result.content {
        match (block.get("type").and_then(Value::as_str), block.get("text").and_then(Value::as_str)) {
            (Some("text"), Some(text)) => writeln!(out, "{text}")?,
            _ => writeln!(out, "{}", pretty(block))?,
        }
    }
    Ok(())
}

/// The tool listing shown for `mcpx <alias>` without a tool name.
pub fn write_tool_table<E: Write>(group: &CapabilityGroup, err: &mut E) -> std::io::Result<()> {
    if group.capabilities().is_empty() {
        return writeln!(err, "Server '{}' provides no tools.", group.alias());
    }

    let width = group
        .names()
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    writeln!(err, "{:<width$}  Description", "Tool")?;
    writeln!(err, "{}", "-".repeat(width + 62))?;
    for capability in group.capabilities() {
        let summary = capability.summary().lines().next().unwrap_or_default();
        writeln!(err, "{:<width$}  {}", capability.name, truncate_string(summary, 60))?;
    }
    writeln!(err)?;
    writeln!(err, "Run 'mcpx {} <tool> --help' for a tool's flags.", group.alias())
}
