//! List command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{print_separator, truncate_string};

/// Execute the list command.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let servers = ctx.store.list_servers();

    if servers.is_empty() {
        eprintln!("No servers configured.");
        eprintln!("Use 'mcpx add <alias> --command <cmd>' or 'mcpx install <url>' to add one.");
        return Ok(());
    }

    println!(
        "{:<16} {:<12} {:<36} {:<20} {:<7}",
        "Alias", "Command", "Args", "Env", "Timeout"
    );
    print_separator(95);

    for server in servers {
        let env_keys = server
            .config
            .env
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<16} {:<12} {:<36} {:<20} {:<7}",
            truncate_string(&server.alias, 16),
            truncate_string(&server.config.command, 12),
            truncate_string(&server.config.args.join(" "), 36),
            truncate_string(&env_keys, 20),
            format!("{}s", server.config.timeout),
        );
    }

    Ok(())
}
