//! Root CLI parser and global flags.

use clap::Parser;

use crate::commands::Commands;

/// Call MCP tool servers as ordinary CLI commands.
///
/// Configured server aliases appear as extra subcommands at runtime; see
/// `crate::router`.
#[derive(Debug, Parser)]
#[command(name = "mcpx")]
#[command(about = "Call MCP servers as CLI commands")]
#[command(version)]
pub struct Cli {
    /// Ignore cached tool schemas and ask the server again
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Enable verbose/debug logging on stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["mcpx", "--refresh", "list", "-v"]);
        assert!(cli.refresh);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::List)));
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["mcpx"]);
        assert!(cli.command.is_none());
    }
}
