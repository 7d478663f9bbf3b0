//! `mcpx`: call MCP tool servers as ordinary CLI commands.
//!
//! Built-in commands manage the server registry; every configured alias
//! becomes a command group whose subcommands are the server's tools.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use mockall as _;

// Runtime is started by the binary
use tokio as _;

pub mod bootstrap;
pub mod commands;
pub mod dispatch;
pub mod dynamic;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod router;
pub mod utils;

use std::io::Write;

use clap::{Command, CommandFactory, FromArgMatches};
use tracing_subscriber::EnvFilter;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use dispatch::Outcome;
pub use error::{CliError, EXIT_INTERRUPTED};
pub use parser::Cli;
pub use router::{GlobalFlags, Route, route};

use handlers::add::AddArgs;
use handlers::install::InstallArgs;
use utils::StdinPrompt;

/// Environment variable holding a tracing filter, e.g. `MCPX_LOG=debug`.
pub const LOG_ENV: &str = "MCPX_LOG";

/// Install the stderr log subscriber. Later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The static CLI plus one placeholder per alias, for help output.
pub fn root_command(ctx: &CliContext) -> Command {
    ctx.store
        .list_servers()
        .into_iter()
        .fold(Cli::command(), |cmd, server| {
            cmd.subcommand(
                Command::new(server.alias.clone())
                    .about(format!("Tools from `{}`", server.command_line())),
            )
        })
}

/// Run one invocation from the process environment.
pub async fn run(argv: &[String]) -> Result<i32, CliError> {
    let mut ctx = bootstrap()?;
    run_with(&mut ctx, argv, &mut std::io::stdout(), &mut std::io::stderr()).await
}

/// Run one invocation against an explicit context and output streams.
///
/// Returns the process exit code for completed runs.
pub async fn run_with<O: Write, E: Write>(
    ctx: &mut CliContext,
    argv: &[String],
    out: &mut O,
    err: &mut E,
) -> Result<i32, CliError> {
    let (flags, target) = route(argv, |name| ctx.is_alias(name));

    if let Route::Alias { alias, argv } = target {
        init_logging(flags.verbose);
        let server = ctx
            .store
            .get_server(&alias)
            .ok_or_else(|| anyhow::anyhow!("Server '{alias}' not found."))?;
        let outcome = dispatch::run_alias(ctx, &server, &argv, flags.refresh, out, err).await?;
        return Ok(outcome.exit_code());
    }

    let mut root = root_command(ctx);
    let matches = root.clone().try_get_matches_from(argv)?;
    let cli = Cli::from_arg_matches(&matches)?;
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        writeln!(err, "{}", root.render_help())?;
        return Ok(0);
    };

    match command {
        Commands::Add {
            alias,
            command,
            args,
            env,
            env_file,
            timeout,
        } => {
            let args = AddArgs {
                alias,
                command,
                args,
                env,
                env_file,
                timeout,
            };
            handlers::add::execute(ctx, &args)?;
        }
        Commands::List => handlers::list::execute(ctx)?,
        Commands::Remove { alias } => handlers::remove::execute(ctx, &alias)?,
        Commands::ConfigLlm {
            model,
            base_url,
            api_key_env,
        } => handlers::config_llm::execute(
            ctx,
            &model,
            base_url.as_deref(),
            api_key_env.as_deref(),
        )?,
        Commands::Install { url, alias, yes } => {
            let args = InstallArgs { url, alias, yes };
            let outcome = handlers::install::execute(ctx, &args, &mut StdinPrompt).await?;
            return Ok(outcome.exit_code());
        }
    }
    Ok(0)
}
