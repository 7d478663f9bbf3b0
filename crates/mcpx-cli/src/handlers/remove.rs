//! Remove command handler.

use anyhow::{Result, bail};

use crate::bootstrap::CliContext;

/// Execute the remove command.
pub fn execute(ctx: &mut CliContext, alias: &str) -> Result<()> {
    if !ctx.store.remove_server(alias)? {
        bail!("Server '{alias}' not found.");
    }
    ctx.cache.invalidate(alias);

    eprintln!("Server '{alias}' removed.");
    Ok(())
}
