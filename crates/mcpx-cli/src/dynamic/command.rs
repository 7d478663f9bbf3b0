//! One clap subcommand per capability.

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use mcpx_core::Capability;
use serde_json::{Map, Number, Value};

use super::schema::{ParamKind, ParameterSpec, derive_parameters};

/// How a tool invocation is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Call the tool and print its content.
    Execute,
    /// Print connection and request/response details, then call.
    Debug,
    /// Print the request that would be sent; never start the server.
    DryRun,
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("Invalid JSON: {e}"))
}

fn parse_number(raw: &str) -> Result<Number, String> {
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| format!("{raw:?} is not a finite number"))
}

fn help_with_default(spec: &ParameterSpec) -> String {
    match &spec.default {
        Some(default) if spec.help.is_empty() => format!("[default: {default}]"),
        Some(default) => format!("{} [default: {default}]", spec.help),
        None => spec.help.clone(),
    }
}

fn args_for(spec: &ParameterSpec) -> Vec<Arg> {
    let help = help_with_default(spec);
    let base = Arg::new(spec.name.clone()).long(spec.name.clone());

    match spec.kind {
        ParamKind::Bool => {
            let negated = format!("no-{}", spec.name);
            vec![
                base.action(ArgAction::SetTrue)
                    .overrides_with(negated.clone())
                    .help(help),
                Arg::new(negated.clone())
                    .long(negated)
                    .action(ArgAction::SetTrue)
                    .overrides_with(spec.name.clone())
                    .help(format!("Set {} to false", spec.name)),
            ]
        }
        kind => {
            let arg = base
                .value_name(kind.value_name())
                .required(spec.required)
                .help(help);
            let arg = match kind {
                ParamKind::Integer => arg.value_parser(value_parser!(i64)),
                ParamKind::Number => arg.value_parser(parse_number),
                ParamKind::Json => arg.value_parser(parse_json),
                _ => arg,
            };
            vec![arg]
        }
    }
}

/// A capability together with its derived flags.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    capability: Capability,
    params: Vec<ParameterSpec>,
}

impl ToolCommand {
    pub fn new(capability: Capability) -> Self {
        let params = derive_parameters(&capability.input_schema);
        Self { capability, params }
    }

    pub const fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Build the clap subcommand, including the shared output flags.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(self.capability.name.clone());
        if let Some(description) = self.capability.description.as_deref() {
            cmd = cmd.about(description.to_string());
        }
        for spec in &self.params {
            cmd = cmd.args(args_for(spec));
        }
        cmd.arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the full result as JSON"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Show server command, environment keys and the raw exchange on stderr"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print the request without starting the server"),
        )
    }

    /// Collect the argument object from parsed flags.
    ///
    /// Absent flags fall back to the schema default. Booleans without one
    /// are sent as `false`; other absent flags are left out.
    pub fn arguments(&self, matches: &ArgMatches) -> Map<String, Value> {
        let mut arguments = Map::new();
        for spec in &self.params {
            let value = match spec.kind {
                ParamKind::Bool => {
                    let negated = format!("no-{}", spec.name);
                    if matches.get_flag(&spec.name) {
                        Some(Value::Bool(true))
                    } else if matches.get_flag(&negated) {
                        Some(Value::Bool(false))
                    } else {
                        Some(spec.default.clone().unwrap_or(Value::Bool(false)))
                    }
                }
                ParamKind::String => matches
                    .get_one::<String>(&spec.name)
                    .map(|s| Value::String(s.clone())),
                ParamKind::Integer => matches.get_one::<i64>(&spec.name).map(|n| Value::from(*n)),
                ParamKind::Number => matches
                    .get_one::<Number>(&spec.name)
                    .map(|n| Value::Number(n.clone())),
                ParamKind::Json => matches.get_one::<Value>(&spec.name).cloned(),
            };

            if let Some(value) = value.or_else(|| spec.default.clone()) {
                arguments.insert(spec.name.clone(), value);
            }
        }
        arguments
    }

    /// Output mode; `--dry-run` wins over `--debug`.
    pub fn mode(matches: &ArgMatches) -> InvocationMode {
        if matches.get_flag("dry-run") {
            InvocationMode::DryRun
        } else if matches.get_flag("debug") {
            InvocationMode::Debug
        } else {
            InvocationMode::Execute
        }
    }

    /// Whether `--json` was given.
    pub fn json_output(matches: &ArgMatches) -> bool {
        matches.get_flag("json")
    }
}
