//! Package registry lookups: `search_npm` and `search_pypi`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value, json};

use crate::toolbox::ToolExecutor;

const REGISTRY_TIMEOUT: Duration = Duration::from_secs(15);

/// Registry base URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub npm_base: String,
    pub pypi_base: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            npm_base: "https://registry.npmjs.org".to_string(),
            pypi_base: "https://pypi.org/pypi".to_string(),
        }
    }
}

fn package_name(arguments: &Map<String, Value>) -> anyhow::Result<&str> {
    arguments
        .get("package_name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing required argument 'package_name'"))
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(REGISTRY_TIMEOUT)
        .build()?)
}

/// Summarize an npm registry document: latest version and its `bin` map.
pub fn summarize_npm(doc: &Value) -> Value {
    let latest = doc
        .pointer("/dist-tags/latest")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let bin = doc
        .get("versions")
        .and_then(|v| v.get(latest))
        .and_then(|v| v.get("bin"))
        .cloned()
        .unwrap_or_else(|| json!({}));
    json!({
        "name": doc.get("name").cloned().unwrap_or(Value::Null),
        "version": latest,
        "description": doc.get("description").and_then(Value::as_str).unwrap_or(""),
        "bin": bin,
    })
}

/// Summarize a PyPI JSON API document.
pub fn summarize_pypi(doc: &Value) -> Value {
    let info = doc.get("info").cloned().unwrap_or_else(|| json!({}));
    json!({
        "name": info.get("name").cloned().unwrap_or(Value::Null),
        "version": info.get("version").cloned().unwrap_or(Value::Null),
        "summary": info.get("summary").and_then(Value::as_str).unwrap_or(""),
    })
}

/// The `search_npm` executor.
#[derive(Debug)]
pub struct SearchNpm {
    client: reqwest::Client,
    base: String,
}

impl SearchNpm {
    pub fn new(config: &RegistryConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            base: config.npm_base.trim_end_matches('/').to_string(),
        })
    }

    async fn lookup(&self, name: &str) -> anyhow::Result<String> {
        // Scoped names keep their slash encoded: @scope%2Fname
        let url = format!("{}/{}", self.base, urlencoding::encode(name));
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(format!("Package '{name}' not found on npm."));
        }
        let doc: Value = response.error_for_status()?.json().await?;
        Ok(summarize_npm(&doc).to_string())
    }
}

#[async_trait]
impl ToolExecutor for SearchNpm {
    async fn execute(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
        let name = package_name(arguments)?;
        Ok(self
            .lookup(name)
            .await
            .unwrap_or_else(|e| format!("Error searching npm: {e}")))
    }
}

/// The `search_pypi` executor.
#[derive(Debug)]
pub struct SearchPypi {
    client: reqwest::Client,
    base: String,
}

impl SearchPypi {
    pub fn new(config: &RegistryConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            base: config.pypi_base.trim_end_matches('/').to_string(),
        })
    }

    async fn lookup(&self, name: &str) -> anyhow::Result<String> {
        let url = format!("{}/{}/json", self.base, urlencoding::encode(name));
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(format!("Package '{name}' not found on PyPI."));
        }
        let doc: Value = response.error_for_status()?.json().await?;
        Ok(summarize_pypi(&doc).to_string())
    }
}

#[async_trait]
impl ToolExecutor for SearchPypi {
    async fn execute(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
        let name = package_name(arguments)?;
        Ok(self
            .lookup(name)
            .await
            .unwrap_or_else(|e| format!("Error searching PyPI: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_summarize_npm_picks_latest_bin() {
        let doc = json!({
            "name": "@modelcontextprotocol/server-github",
            "description": "GitHub MCP server",
            "dist-tags": { "latest": "2.0.0" },
            "versions": {
                "1.0.0": { "bin": { "old": "x.js" } },
                "2.0.0": { "bin": { "mcp-server-github": "dist/index.js" } },
            },
        });
        let summary = summarize_npm(&doc);
        assert_eq!(summary["version"], "2.0.0");
        assert_eq!(summary["bin"]["mcp-server-github"], "dist/index.js");
        assert_eq!(summary["name"], "@modelcontextprotocol/server-github");
    }

    #[test]
    fn test_summarize_npm_tolerates_sparse_documents() {
        let summary = summarize_npm(&json!({ "name": "bare" }));
        assert_eq!(summary["version"], "unknown");
        assert_eq!(summary["bin"], json!({}));
        assert_eq!(summary["description"], "");
    }

    #[test]
    fn test_summarize_pypi() {
        let doc = json!({ "info": { "name": "mcp-server-time", "version": "0.6.2", "summary": "Time tools" } });
        let summary = summarize_pypi(&doc);
        assert_eq!(summary, json!({ "name": "mcp-server-time", "version": "0.6.2", "summary": "Time tools" }));
    }

    #[tokio::test]
    async fn test_missing_package_name_is_an_error() {
        let npm = SearchNpm::new(&RegistryConfig::default()).unwrap();
        assert_err!(npm.execute(&Map::new()).await);

        let mut args = Map::new();
        args.insert("package_name".to_string(), json!("  "));
        let pypi = SearchPypi::new(&RegistryConfig::default()).unwrap();
        assert_err!(pypi.execute(&args).await);
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_reported_as_text() {
        let config = RegistryConfig {
            npm_base: "http://127.0.0.1:9".to_string(),
            pypi_base: "http://127.0.0.1:9".to_string(),
        };
        let mut args = Map::new();
        args.insert("package_name".to_string(), json!("left-pad"));

        let out = assert_ok!(SearchNpm::new(&config).unwrap().execute(&args).await);
        assert!(out.starts_with("Error searching npm: "), "{out}");
        let out = assert_ok!(SearchPypi::new(&config).unwrap().execute(&args).await);
        assert!(out.starts_with("Error searching PyPI: "), "{out}");
    }
}
