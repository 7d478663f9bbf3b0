//! Per-alias command groups backed by the schema cache.

use clap::Command;
use mcpx_core::{Capability, ServerDefinition};

use crate::bootstrap::CliContext;
use crate::error::CliError;

use super::command::ToolCommand;

/// The capabilities of one server, presented as a command group.
#[derive(Debug, Clone)]
pub struct CapabilityGroup {
    alias: String,
    capabilities: Vec<Capability>,
}

impl CapabilityGroup {
    pub fn new(alias: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        Self {
            alias: alias.into(),
            capabilities,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Tool names in server order.
    pub fn names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a capability by name.
    pub fn resolve(&self, name: &str) -> Option<ToolCommand> {
        self.capabilities
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .map(ToolCommand::new)
    }

    /// The clap command for `mcpx <alias> …`.
    pub fn to_command(&self) -> Command {
        let subcommands = self
            .capabilities
            .iter()
            .map(|c| ToolCommand::new(c.clone()).command());
        Command::new(self.alias.clone())
            .about(format!("Tools provided by server '{}'", self.alias))
            .disable_help_subcommand(true)
            .subcommands(subcommands)
    }
}

/// Load the group for `server`, from the cache when possible.
///
/// With `refresh` the cache is ignored. A freshly discovered snapshot is
/// saved unless caching is disabled; a failed save only logs.
pub async fn load_group(
    ctx: &CliContext,
    server: &ServerDefinition,
    refresh: bool,
) -> Result<CapabilityGroup, CliError> {
    let alias = server.alias.as_str();
    if ctx.cache_enabled()
        && !refresh
        && let Some(capabilities) = ctx.cache.load(alias)
    {
        tracing::debug!(alias, count = capabilities.len(), "Using cached tool schemas");
        return Ok(CapabilityGroup::new(alias, capabilities));
    }

    tracing::debug!(alias, "Discovering tools from server");
    let capabilities = ctx.backend.list_capabilities(server).await?;

    if ctx.cache_enabled()
        && let Err(e) = ctx.cache.save(alias, &capabilities)
    {
        tracing::warn!(alias, error = %e, "Failed to cache tool schemas");
    }
    Ok(CapabilityGroup::new(alias, capabilities))
}
