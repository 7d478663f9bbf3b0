//! `config-llm` command handler.

use anyhow::Result;
use mcpx_core::LlmConfig;

use crate::bootstrap::CliContext;

/// Execute the config-llm command. Unset options keep their current value.
pub fn execute(
    ctx: &mut CliContext,
    model: &str,
    base_url: Option<&str>,
    api_key_env: Option<&str>,
) -> Result<()> {
    let current = ctx.store.config().llm.clone();
    let llm = LlmConfig {
        model: model.to_string(),
        base_url: base_url.map_or(current.base_url, ToString::to_string),
        api_key_env: api_key_env.map_or(current.api_key_env, ToString::to_string),
    };
    ctx.store.set_llm(llm)?;

    eprintln!("LLM model set to {model}.");
    Ok(())
}
