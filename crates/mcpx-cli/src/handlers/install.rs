//! Install command handler: let the model find a server, then register it.

use std::io::Write;

use mcpx_agent::{AgentObserver, ModelClient, OpenAiClient, run_install};
use mcpx_core::InstallSpec;
use serde_json::{Map, Value};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_call;
use crate::utils::Prompt;

/// Arguments for `mcpx install`.
#[derive(Debug, Clone, Default)]
pub struct InstallArgs {
    pub url: String,
    pub alias: Option<String>,
    pub yes: bool,
}

/// How an install run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Added(String),
    /// The model could not propose a server.
    NothingFound,
    /// The user declined the proposal.
    Declined,
}

impl InstallOutcome {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NothingFound => 1,
            Self::Added(_) | Self::Declined => 0,
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

/// One progress line per agent step, e.g. `  Step 1: fetch_url(url='…')`.
pub fn format_step(step: usize, name: &str, arguments: &Map<String, Value>) -> String {
    let args = arguments
        .iter()
        .map(|(k, v)| format!("{k}={}", display_value(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("  Step {step}: {name}({args})")
}

/// The equivalent `mcpx add` command line for a spec.
pub fn add_command_line(spec: &InstallSpec) -> String {
    let mut words = vec!["mcpx", "add", spec.alias.as_str(), "--command", spec.command.as_str()];
    for arg in &spec.args {
        words.push("--args");
        words.push(arg);
    }
    format_call(&words)
}

/// Reports agent progress on a writer.
struct ProgressWriter<'a, W: Write> {
    out: &'a mut W,
}

impl<W: Write> AgentObserver for ProgressWriter<'_, W> {
    fn on_step(&mut self, step: usize, name: &str, arguments: &Map<String, Value>) {
        let _ = writeln!(self.out, "{}", format_step(step, name, arguments));
    }

    fn on_text(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }
}

/// Execute the install command against the configured model endpoint.
pub async fn execute(
    ctx: &mut CliContext,
    args: &InstallArgs,
    prompt: &mut dyn Prompt,
) -> Result<InstallOutcome, CliError> {
    let llm = ctx.store.config().llm.clone();
    let model = OpenAiClient::from_config(&llm).map_err(mcpx_agent::AgentError::from)?;
    eprintln!("Analyzing {} with {}...", args.url, llm.model);
    install_with(ctx, &model, args, prompt, &mut std::io::stderr()).await
}

/// Run the install flow with an explicit model, prompt and output.
pub async fn install_with<W: Write>(
    ctx: &mut CliContext,
    model: &dyn ModelClient,
    args: &InstallArgs,
    prompt: &mut dyn Prompt,
    out: &mut W,
) -> Result<InstallOutcome, CliError> {
    let proposal = {
        let mut progress = ProgressWriter { out: &mut *out };
        run_install(model, &args.url, &ctx.registry, &mut progress).await?
    };
    let Some(mut spec) = proposal else {
        return Ok(InstallOutcome::NothingFound);
    };

    if let Some(alias) = &args.alias {
        spec.alias.clone_from(alias);
        spec.validate().map_err(mcpx_agent::AgentError::from)?;
    }

    writeln!(out)?;
    writeln!(out, "Generated command: {}", add_command_line(&spec))?;
    if !spec.env_vars.is_empty() {
        writeln!(out, "Required env vars: {}", spec.env_vars.join(", "))?;
    }
    if !spec.notes.is_empty() {
        writeln!(out, "Notes: {}", spec.notes)?;
    }

    if !args.yes && !prompt.confirm("Proceed?")? {
        return Ok(InstallOutcome::Declined);
    }

    let mut config = spec.to_server_config().with_timeout(ctx.store.config().global_timeout);
    if !args.yes {
        for var in &spec.env_vars {
            let value = prompt.ask(&format!("  {var}"))?;
            if !value.is_empty() {
                config.env.insert(var.clone(), value);
            }
        }
    }

    ctx.store.add_server(&spec.alias, config)?;
    ctx.cache.invalidate(&spec.alias);
    writeln!(out)?;
    writeln!(out, "Server '{}' added.", spec.alias)?;
    Ok(InstallOutcome::Added(spec.alias))
}
