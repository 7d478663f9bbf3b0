//! Capability ("tool") definitions discovered from a server.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Tool definition as reported by a server's `tools/list`.
///
/// Serialized in MCP wire form (`inputSchema`) so cache files stay readable
/// by anything that understands the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Tool name, unique within one server.
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for the tool's arguments (a flat object).
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

impl Capability {
    /// Create a capability with an empty object schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: empty_object_schema(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Description or an empty string.
    pub fn summary(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Drop capabilities whose name was already seen, keeping the first.
///
/// Servers are external and may misbehave; a snapshot must never hold two
/// capabilities with the same name.
pub fn unique_by_name(capabilities: Vec<Capability>) -> Vec<Capability> {
    let mut seen = HashSet::new();
    capabilities
        .into_iter()
        .filter(|cap| {
            let fresh = seen.insert(cap.name.clone());
            if !fresh {
                tracing::warn!(tool = %cap.name, "Dropping duplicate tool name from server");
            }
            fresh
        })
        .collect()
}
