//! Built-in subcommands.

use clap::Subcommand;

/// Top-level commands that are not server aliases.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register a stdio MCP server under an alias
    Add {
        /// Alias used as the command group name
        alias: String,

        /// Executable that starts the server
        #[arg(long)]
        command: String,

        /// Argument passed to the server (repeatable)
        #[arg(long = "args", value_name = "ARG", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Environment variable as KEY=VAL (repeatable)
        #[arg(long = "env", value_name = "KEY=VAL")]
        env: Vec<String>,

        /// Dotenv file loaded when the server starts
        #[arg(long)]
        env_file: Option<String>,

        /// Handshake timeout in seconds (defaults to the global timeout)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List configured servers
    List,

    /// Remove a configured server
    Remove {
        /// Alias of the server to remove
        alias: String,
    },

    /// Configure the model used by `install`
    ConfigLlm {
        /// Model name, e.g. gpt-4o
        #[arg(long)]
        model: String,

        /// Base URL of an OpenAI-compatible API
        #[arg(long)]
        base_url: Option<String>,

        /// Environment variable that holds the API key
        #[arg(long)]
        api_key_env: Option<String>,
    },

    /// Discover and register an MCP server from a URL using an LLM
    Install {
        /// Repository, package or documentation URL
        url: String,

        /// Override the alias proposed by the model
        #[arg(long)]
        alias: Option<String>,

        /// Skip confirmation and environment prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use crate::parser::Cli;
    use clap::Parser;

    use super::*;

    #[test]
    fn test_add_collects_repeated_flags() {
        let cli = Cli::parse_from([
            "mcpx", "add", "fs", "--command", "npx", "--args", "-y", "--args",
            "@modelcontextprotocol/server-filesystem", "--env", "A=1", "--env", "B=2",
            "--timeout", "10",
        ]);
        let Some(Commands::Add {
            alias,
            command,
            args,
            env,
            env_file,
            timeout,
        }) = cli.command
        else {
            panic!("expected add");
        };
        assert_eq!(alias, "fs");
        assert_eq!(command, "npx");
        assert_eq!(args, vec!["-y", "@modelcontextprotocol/server-filesystem"]);
        assert_eq!(env, vec!["A=1", "B=2"]);
        assert_eq!(env_file, None);
        assert_eq!(timeout, Some(10));
    }

    #[test]
    fn test_add_requires_command() {
        assert!(Cli::try_parse_from(["mcpx", "add", "fs"]).is_err());
    }

    #[test]
    fn test_config_llm_name() {
        let cli = Cli::parse_from(["mcpx", "config-llm", "--model", "gpt-4o-mini"]);
        assert!(matches!(
            cli.command,
            Some(Commands::ConfigLlm { ref model, .. }) if model == "gpt-4o-mini"
        ));
    }

    #[test]
    fn test_install_flags() {
        let cli = Cli::parse_from(["mcpx", "install", "https://x.dev", "-y", "--alias", "x"]);
        let Some(Commands::Install { url, alias, yes }) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(url, "https://x.dev");
        assert_eq!(alias.as_deref(), Some("x"));
        assert!(yes);
    }
}
