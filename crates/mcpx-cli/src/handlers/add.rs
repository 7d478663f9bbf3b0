//! Add command handler.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use mcpx_core::ServerConfig;

use crate::bootstrap::CliContext;

/// Arguments for `mcpx add`.
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub alias: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub env_file: Option<String>,
    pub timeout: Option<u64>,
}

/// Parse repeated `KEY=VAL` options. Values may contain `=`.
pub fn parse_env_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                env.insert(key.to_string(), value.to_string());
            }
            _ => bail!("Invalid env format: {pair:?}. Use KEY=VAL."),
        }
    }
    Ok(env)
}

/// Build the server configuration described by `args`.
pub fn server_config(args: &AddArgs, default_timeout: u64) -> Result<ServerConfig> {
    let mut config = ServerConfig::new(args.command.clone(), args.args.clone())
        .with_timeout(args.timeout.unwrap_or(default_timeout));
    config.env = parse_env_pairs(&args.env)?;
    config.env_file.clone_from(&args.env_file);
    Ok(config)
}

/// Execute the add command.
pub fn execute(ctx: &mut CliContext, args: &AddArgs) -> Result<()> {
    let config = server_config(args, ctx.store.config().global_timeout)?;
    ctx.store.add_server(&args.alias, config)?;
    // A redefined server may expose different tools
    ctx.cache.invalidate(&args.alias);

    tracing::debug!(alias = %args.alias, "Server added");
    eprintln!("Server '{}' added.", args.alias);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_pairs() {
        let env = parse_env_pairs(&["A=1".into(), "URL=http://x/?a=b".into(), "EMPTY=".into()]).unwrap();
        assert_eq!(env["A"], "1");
        assert_eq!(env["URL"], "http://x/?a=b");
        assert_eq!(env["EMPTY"], "");
    }

    #[test]
    fn test_parse_env_pairs_rejects_bad_input() {
        let err = parse_env_pairs(&["NOEQUALS".into()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid env format: \"NOEQUALS\". Use KEY=VAL.");
        assert!(parse_env_pairs(&["=value".into()]).is_err());
    }

    #[test]
    fn test_server_config_uses_default_timeout() {
        let args = AddArgs {
            alias: "time".into(),
            command: "uvx".into(),
            args: vec!["mcp-server-time".into()],
            env_file: Some(".env.time".into()),
            ..AddArgs::default()
        };
        let config = server_config(&args, 45).unwrap();
        assert_eq!(config.timeout, 45);
        assert_eq!(config.env_file.as_deref(), Some(".env.time"));

        let explicit = AddArgs {
            timeout: Some(5),
            ..args
        };
        assert_eq!(server_config(&explicit, 45).unwrap().timeout, 5);
    }
}
