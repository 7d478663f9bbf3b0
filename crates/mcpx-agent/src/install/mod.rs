//! Auto-install: investigate a URL and propose a server definition.

mod fetch;
mod registry;

pub use fetch::{FetchUrl, HtmlText, MAX_TEXT_LENGTH, blocked_kind, validate_url};
pub use registry::{RegistryConfig, SearchNpm, SearchPypi, summarize_npm, summarize_pypi};

use mcpx_core::InstallSpec;
use serde_json::json;

use crate::agent_loop::{AgentObserver, AgentRequest, DEFAULT_MAX_STEPS, run_agent_loop};
use crate::error::AgentError;
use crate::model::ModelClient;
use crate::toolbox::{ToolDef, Toolbox};

/// Name of the terminal tool.
pub const INSTALL_TOOL: &str = "install_server";

pub const SYSTEM_PROMPT: &str = "\
You are an expert at configuring MCP (Model Context Protocol) servers.
You receive a URL and have tools to investigate it and install the server.

Strategy:
1. Fetch the given URL to understand what MCP server it describes.
2. Find the GitHub repo owner/name. Fetch the RAW package manifest:
   - Node: https://raw.githubusercontent.com/<owner>/<repo>/HEAD/package.json
   - Python: https://raw.githubusercontent.com/<owner>/<repo>/HEAD/pyproject.toml
   Read the exact \"name\" field from the manifest.
3. Search for that exact name on npm (search_npm) or PyPI (search_pypi).
   If not found, also try common variations (scoped name @owner/name, with -mcp suffix).
4. Install based on what you found:

   a) Published on npm:  command=\"npx\", args=[\"-y\", \"<exact-npm-name>\"]
   b) Published on PyPI: command=\"uvx\", args=[\"<exact-pypi-name>\"]
   c) NOT on any registry, Python repo with [project.scripts] entry point:
      command=\"uvx\", args=[\"--from\", \"git+https://github.com/<owner>/<repo>\", \"<entry-point>\"]

5. Only respond with text (no install_server) if the package truly cannot be \
installed via npx or uvx (no entry point, Docker-only, requires build, etc.).

IMPORTANT: `npx github:<owner>/<repo>` is unreliable: it fails for TypeScript \
repos that need compilation. NEVER use it. Always prefer registry-published packages \
(strategy 4a/4b) or uvx --from git+ for Python (4c).

Rules:
- command MUST be `npx` or `uvx`. Never use node, python, or absolute paths.
- For npx, always include `-y` as the first arg.
- alias should be short, lowercase, descriptive (e.g. \"time\", \"github\", \"slack\").
- env_vars: list only the NAMES of required environment variables, not values.
";

/// First user message for `url`.
pub fn user_message(url: &str) -> String {
    format!("Install MCP server from this URL: {url}")
}

fn string_param(description: &str) -> serde_json::Value {
    json!({ "type": "string", "description": description })
}

/// The four install tools; `install_server` is terminal.
pub fn build_toolbox(registry: &RegistryConfig) -> Result<Toolbox, AgentError> {
    let fetch = FetchUrl::new().map_err(|e| AgentError::Setup(e.to_string()))?;
    let npm = SearchNpm::new(registry).map_err(|e| AgentError::Setup(e.to_string()))?;
    let pypi = SearchPypi::new(registry).map_err(|e| AgentError::Setup(e.to_string()))?;

    let tools = vec![
        ToolDef::new(
            "fetch_url",
            "Fetch a web page and return its text content (HTML stripped to text). \
             Use for GitHub pages, READMEs, package.json, etc.",
            json!({
                "type": "object",
                "properties": { "url": string_param("URL to fetch") },
                "required": ["url"],
            }),
            fetch,
        ),
        ToolDef::new(
            "search_npm",
            "Check if an npm package exists. Returns name, version, description, and bin entries.",
            json!({
                "type": "object",
                "properties": { "package_name": string_param("npm package name") },
                "required": ["package_name"],
            }),
            npm,
        ),
        ToolDef::new(
            "search_pypi",
            "Check if a Python package exists on PyPI. Returns name, version, and summary.",
            json!({
                "type": "object",
                "properties": { "package_name": string_param("PyPI package name") },
                "required": ["package_name"],
            }),
            pypi,
        ),
        ToolDef::terminal(
            INSTALL_TOOL,
            "Install the MCP server. Only call this after verifying the package exists.",
            json!({
                "type": "object",
                "properties": {
                    "alias": string_param("Short lowercase alias for the server"),
                    "command": string_param("Command to run: 'npx' or 'uvx'"),
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Command arguments",
                    },
                    "env_vars": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Required environment variable names",
                    },
                    "notes": string_param("Any notes for the user"),
                },
                "required": ["alias", "command", "args"],
            }),
        ),
    ];

    Ok(Toolbox::new(tools, INSTALL_TOOL))
}

/// Run the install agent for `url`.
///
/// `Ok(None)` means the model could not find an installable server. A
/// proposal that fails validation (e.g. a launcher other than `npx`/`uvx`)
/// is an error and must never be persisted.
pub async fn run_install(
    model: &dyn ModelClient,
    url: &str,
    registry: &RegistryConfig,
    observer: &mut dyn AgentObserver,
) -> Result<Option<InstallSpec>, AgentError> {
    let toolbox = build_toolbox(registry)?;
    let request = AgentRequest::new(SYSTEM_PROMPT, user_message(url)).with_max_steps(DEFAULT_MAX_STEPS);

    match run_agent_loop(model, &request, &toolbox, observer).await? {
        Some(arguments) => Ok(Some(InstallSpec::from_tool_arguments(arguments)?)),
        None => Ok(None),
    }
}
