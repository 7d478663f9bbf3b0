//! Name-keyed table of tools offered to the model.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::model::ToolSpec;

/// Runs one local tool. Failures are returned as errors and turned into
/// tool results by the loop; they never abort it.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, arguments: &Map<String, Value>) -> anyhow::Result<String>;
}

/// A tool the model may call.
///
/// A tool without an executor is terminal: calling it ends the loop and its
/// arguments become the loop's result.
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub executor: Option<Box<dyn ToolExecutor>>,
}

impl std::fmt::Debug for ToolDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDef")
            .field("name", &self.name)
            .field("terminal", &self.executor.is_none())
            .finish_non_exhaustive()
    }
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        executor: impl ToolExecutor + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            executor: Some(Box::new(executor)),
        }
    }

    pub fn terminal(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            executor: None,
        }
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// The tools for one agent run plus the name of the terminal tool.
#[derive(Debug)]
pub struct Toolbox {
    tools: Vec<ToolDef>,
    terminal: String,
}

impl Toolbox {
    pub fn new(tools: Vec<ToolDef>, terminal: impl Into<String>) -> Self {
        Self {
            tools,
            terminal: terminal.into(),
        }
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(ToolDef::spec).collect()
    }
}
