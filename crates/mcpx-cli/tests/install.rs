//! `mcpx install` flow with a scripted model and scripted answers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mcpx_agent::{ChatMessage, ModelClient, ModelError, ModelResponse, RegistryConfig, ToolCallRequest, ToolSpec};
use mcpx_cli::handlers::install::{InstallArgs, InstallOutcome, install_with};
use mcpx_cli::utils::Prompt;
use mcpx_cli::{CliContext, CliError};
use mcpx_core::{ConfigStore, ResolvedPaths, SchemaCache};
use mcpx_mcp::MockToolBackend;
use tempfile::TempDir;

struct ScriptedModel {
    turns: Mutex<VecDeque<ModelResponse>>,
}

impl ScriptedModel {
    fn proposing(arguments: &str) -> Self {
        Self {
            turns: Mutex::new(
                vec![
                    ModelResponse::calls(vec![ToolCallRequest::new(
                        "c1",
                        "fetch_url",
                        r#"{"url":"ftp://example.com/readme"}"#,
                    )]),
                    ModelResponse::calls(vec![ToolCallRequest::new("c2", "install_server", arguments)]),
                ]
                .into(),
            ),
        }
    }

    fn giving_up() -> Self {
        Self {
            turns: Mutex::new(vec![ModelResponse::text("Docker only, cannot install.")].into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ModelResponse, ModelError> {
        Ok(self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ModelResponse::text("done")))
    }
}

struct Answers {
    confirm: bool,
    values: VecDeque<String>,
    asked: Vec<String>,
}

impl Answers {
    fn new(confirm: bool, values: &[&str]) -> Self {
        Self {
            confirm,
            values: values.iter().map(ToString::to_string).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for Answers {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        self.asked.push(prompt.to_string());
        Ok(self.confirm)
    }

    fn ask(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.asked.push(prompt.to_string());
        Ok(self.values.pop_front().unwrap_or_default())
    }
}

fn context(dir: &TempDir) -> CliContext {
    let paths = ResolvedPaths::from_config_dir(dir.path().to_path_buf());
    let store = ConfigStore::open(&paths.config_file).unwrap();
    let mut ctx = CliContext::new(
        store,
        SchemaCache::new(&paths.cache_dir),
        Arc::new(MockToolBackend::new()),
    );
    ctx.registry = RegistryConfig {
        npm_base: "http://127.0.0.1:9".to_string(),
        pypi_base: "http://127.0.0.1:9".to_string(),
    };
    ctx
}

const GITHUB: &str = r#"{"alias":"github","command":"npx","args":["-y","@modelcontextprotocol/server-github"],"env_vars":["GITHUB_TOKEN","GITHUB_ORG"],"notes":"Needs a token"}"#;

#[tokio::test]
async fn test_confirmed_install_registers_server() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let mut answers = Answers::new(true, &["ghp_123", ""]);
    let mut out = Vec::new();
    let args = InstallArgs {
        url: "https://github.com/modelcontextprotocol/servers".into(),
        ..InstallArgs::default()
    };

    let outcome = install_with(&mut ctx, &ScriptedModel::proposing(GITHUB), &args, &mut answers, &mut out)
        .await
        .unwrap();

    assert_eq!(outcome, InstallOutcome::Added("github".into()));
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("  Step 1: fetch_url(url='ftp://example.com/readme')"), "{text}");
    assert!(text.contains(
        "Generated command: mcpx add github --command npx --args -y --args @modelcontextprotocol/server-github"
    ));
    assert!(text.contains("Required env vars: GITHUB_TOKEN, GITHUB_ORG"));
    assert!(text.contains("Notes: Needs a token"));
    assert_eq!(answers.asked, vec!["Proceed?", "  GITHUB_TOKEN", "  GITHUB_ORG"]);

    let server = ctx.store.get_server("github").unwrap();
    assert_eq!(server.config.command, "npx");
    assert_eq!(server.config.env.get("GITHUB_TOKEN").map(String::as_str), Some("ghp_123"));
    assert!(!server.config.env.contains_key("GITHUB_ORG"), "empty answers are skipped");
}

#[tokio::test]
async fn test_yes_skips_prompts_and_alias_overrides() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let mut answers = Answers::new(false, &[]);
    let args = InstallArgs {
        url: "https://github.com/x/y".into(),
        alias: Some("gh".into()),
        yes: true,
    };

    let outcome = install_with(&mut ctx, &ScriptedModel::proposing(GITHUB), &args, &mut answers, &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(outcome, InstallOutcome::Added("gh".into()));
    assert!(answers.asked.is_empty());
    assert!(ctx.store.get_server("github").is_none());
    assert!(ctx.store.get_server("gh").unwrap().config.env.is_empty());
}

#[tokio::test]
async fn test_declined_install_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let args = InstallArgs {
        url: "https://github.com/x/y".into(),
        ..InstallArgs::default()
    };

    let outcome = install_with(
        &mut ctx,
        &ScriptedModel::proposing(GITHUB),
        &args,
        &mut Answers::new(false, &[]),
        &mut Vec::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome, InstallOutcome::Declined);
    assert_eq!(outcome.exit_code(), 0);
    assert!(ctx.store.list_servers().is_empty());
}

#[tokio::test]
async fn test_no_proposal_exits_one() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let mut out = Vec::new();
    let args = InstallArgs {
        url: "https://example.com".into(),
        ..InstallArgs::default()
    };

    let outcome = install_with(&mut ctx, &ScriptedModel::giving_up(), &args, &mut Answers::new(true, &[]), &mut out)
        .await
        .unwrap();

    assert_eq!(outcome, InstallOutcome::NothingFound);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(String::from_utf8(out).unwrap(), "Docker only, cannot install.\n");
}

#[tokio::test]
async fn test_invalid_launcher_is_never_saved() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(&dir);
    let args = InstallArgs {
        url: "https://example.com".into(),
        yes: true,
        ..InstallArgs::default()
    };

    let err = install_with(
        &mut ctx,
        &ScriptedModel::proposing(r#"{"alias":"x","command":"sh","args":["-c","true"]}"#),
        &args,
        &mut Answers::new(true, &[]),
        &mut Vec::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::Agent(_)), "{err:?}");
    assert!(err.to_string().starts_with("Agent error: "));
    assert!(ctx.store.list_servers().is_empty());
}
