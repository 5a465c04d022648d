//! Package values: defaults from `values.yaml` plus caller overrides.
//!
//! Values are a string-keyed map of [`serde_json::Value`] trees. The same type
//! is the template engine's value type, so no conversion happens between
//! loading and rendering.
//!
//! Overrides are merged **shallowly**: an override key replaces the value at
//! that top-level key wholesale. Nested maps are not merged.
//!
//! ```rust
//! use cpm_cli::values::{merge, parse_set_overrides};
//! use serde_json::json;
//!
//! let base = json!({"resources": {"cpu": "1000m", "mem": "512Mi"}, "replicas": 1});
//! let overrides = parse_set_overrides(&["replicas=3".to_string()]).unwrap();
//! let merged = merge(base.as_object().unwrap().clone(), &overrides);
//! assert_eq!(merged["replicas"], json!("3"));
//! assert_eq!(merged["resources"]["cpu"], json!("1000m"));
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::core::CpmError;

/// The values tree passed to templates
pub type Values = serde_json::Map<String, Value>;

/// File name of the package's default values.
pub const VALUES_FILE: &str = "values.yaml";

/// Load `package_dir/values.yaml`.
///
/// A missing file, an empty document or a `null` document yields an empty map.
///
/// # Errors
///
/// [`CpmError::ValuesParseError`] naming the file when the YAML is malformed or
/// the document is not a mapping.
pub fn load_values(package_dir: &Path) -> Result<Values> {
    let path = package_dir.join(VALUES_FILE);
    if !path.exists() {
        tracing::debug!("No {} in {}, using empty values", VALUES_FILE, package_dir.display());
        return Ok(Values::new());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read values file: {}", path.display()))?;

    parse_values(&content).map_err(|reason| {
        anyhow::Error::from(CpmError::ValuesParseError {
            file: path.display().to_string(),
            reason,
        })
    })
}

fn parse_values(content: &str) -> std::result::Result<Values, String> {
    if content.trim().is_empty() {
        return Ok(Values::new());
    }
    let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    match value {
        Value::Null => Ok(Values::new()),
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a mapping at the top level, found {}", type_name(&other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Apply `overrides` on top of `base`, one level deep.
pub fn merge(mut base: Values, overrides: &Values) -> Values {
    for (key, value) in overrides {
        base.insert(key.clone(), value.clone());
    }
    base
}

/// Parse `key=value` pairs from the command line.
///
/// Each argument is split at its first `=`, so values may contain `=`. Values
/// are kept as strings. Later arguments win.
///
/// # Errors
///
/// [`CpmError::Validation`] for an argument without `=` or with an empty key.
pub fn parse_set_overrides(pairs: &[String]) -> Result<Values, CpmError> {
    let mut values = Values::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            CpmError::validation(format!("invalid --set value '{}': expected key=value", pair))
        })?;
        if key.is_empty() {
            return Err(CpmError::validation(format!("invalid --set value '{}': empty key", pair)));
        }
        values.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(values)
}
