//! Input schema handling: flag derivation and argument validation.
//!
//! Only the top level of a schema becomes flags. Nested objects and arrays
//! are passed as JSON text; the full schema is enforced afterwards by
//! [`validate_arguments`].

use serde_json::{Map, Value};

/// Flag names owned by every tool command.
pub const RESERVED_FLAGS: &[&str] = &["help", "json", "debug", "dry-run"];

/// How a flag's text is turned into a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `--x` / `--no-x` pair.
    Bool,
    String,
    Integer,
    Number,
    /// Parsed as a JSON document (objects, arrays, unions, unknown types).
    Json,
}

impl ParamKind {
    fn from_schema(property: &Value) -> Self {
        match property.get("type") {
            None => Self::String,
            Some(Value::String(t)) => match t.as_str() {
                "string" => Self::String,
                "integer" => Self::Integer,
                "number" => Self::Number,
                "boolean" => Self::Bool,
                _ => Self::Json,
            },
            Some(_) => Self::Json,
        }
    }

    /// Placeholder shown in help output.
    pub const fn value_name(self) -> &'static str {
        match self {
            Self::Bool => "",
            Self::String => "TEXT",
            Self::Integer => "INTEGER",
            Self::Number => "NUMBER",
            Self::Json => "JSON",
        }
    }
}

/// One top-level schema property, as a CLI flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Property name; also the flag name.
    pub name: String,
    pub kind: ParamKind,
    /// Listed in `required` and without a default.
    pub required: bool,
    /// Used when the flag is absent.
    pub default: Option<Value>,
    pub help: String,
}

impl ParameterSpec {
    /// The `--no-…` companion for boolean flags.
    pub fn negated_name(&self) -> Option<String> {
        (self.kind == ParamKind::Bool).then(|| format!("no-{}", self.name))
    }
}

fn usable_flag_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.chars().any(|c| c.is_whitespace() || c == '=')
}

/// Derive flag specifications from a capability's input schema.
///
/// Properties keep schema order. A missing `type` is treated as a string.
/// Reserved names and names that cannot be spelled as a flag are skipped
/// with a warning.
pub fn derive_parameters(schema: &Value) -> Vec<ParameterSpec> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut specs: Vec<ParameterSpec> = Vec::with_capacity(properties.len());
    for (name, property) in properties {
        if RESERVED_FLAGS.contains(&name.as_str()) {
            tracing::warn!(property = %name, "Tool parameter collides with a built-in flag, skipping");
            continue;
        }
        if !usable_flag_name(name) {
            tracing::warn!(property = %name, "Tool parameter cannot be used as a flag, skipping");
            continue;
        }

        let kind = ParamKind::from_schema(property);
        let default = property.get("default").cloned();
        let spec = ParameterSpec {
            name: name.clone(),
            kind,
            required: kind != ParamKind::Bool
                && default.is_none()
                && required.contains(&name.as_str()),
            default,
            help: property
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };

        let taken = |flag: &str| {
            specs
                .iter()
                .any(|s| s.name == flag || s.negated_name().as_deref() == Some(flag))
        };
        if taken(&spec.name) || spec.negated_name().is_some_and(|n| taken(&n)) {
            tracing::warn!(property = %name, "Tool parameter clashes with another flag, skipping");
            continue;
        }
        specs.push(spec);
    }
    specs
}

fn describe_error(error: &jsonschema::ValidationError<'_>) -> String {
    let path = error.instance_path.to_string();
    if path.is_empty() {
        error.to_string()
    } else {
        format!("{path}: {error}")
    }
}

/// Check `arguments` against the capability's full input schema.
///
/// A schema that cannot be compiled is logged and skipped; the server is
/// still the final authority on its own input.
pub fn validate_arguments(schema: &Value, arguments: &Map<String, Value>) -> Result<(), String> {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            tracing::warn!(error = %e, "Tool input schema does not compile, skipping validation");
            return Ok(());
        }
    };

    let instance = Value::Object(arguments.clone());
    let errors: Vec<String> = validator
        .iter_errors(&instance)
        .map(|e| describe_error(&e))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
