//! Custom Tera filters and functions for CPM templates.
//!
//! The engine's built-ins already cover string case transforms (`upper`,
//! `lower`, `title`, `capitalize`), defaulting (`default`) and list/map
//! utilities (`length`, `join`, `first`, `last`, `sort`, `unique`, `concat`,
//! `get`). This module adds the helpers workflow templates need on top:
//!
//! - `required` - fail with a custom message when a value is null or empty
//!   (both a function and a filter)
//! - `toYaml` - serialize a value to YAML without the trailing newline
//! - `toJson` - compact JSON encoding for embedding structured values
//! - `indent` / `nindent` - indent every line, `nindent` adds a leading newline
//! - `quote` - wrap the string form of a value in double quotes
//! - `keys` - sorted key list of a map
//!
//! # Examples
//!
//! ```text
//! {
//!   "name": "{{ Values.name | required(message="name is required") }}",
//!   "env": {{ Values.env | toJson }},
//!   "colonyId": {{ required(message="colonyId is required", value=Values.colonyId) | quote }}
//! }
//! ```

use std::collections::HashMap;

use tera::{Tera, Value};

/// Register every CPM filter and function on a Tera instance.
pub fn register_all(tera: &mut Tera) {
    tera.register_function("required", required_function);
    tera.register_filter("required", required_filter);
    tera.register_filter("toYaml", to_yaml_filter);
    tera.register_filter("toJson", to_json_filter);
    tera.register_filter("indent", indent_filter);
    tera.register_filter("nindent", nindent_filter);
    tera.register_filter("quote", quote_filter);
    tera.register_filter("keys", keys_filter);
}

fn message_arg(args: &HashMap<String, Value>) -> tera::Result<String> {
    match args.get("message") {
        Some(Value::String(message)) => Ok(message.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(tera::Error::msg("required: missing `message` argument")),
    }
}

fn check_required(message: String, value: &Value) -> tera::Result<Value> {
    match value {
        Value::Null => Err(tera::Error::msg(message)),
        Value::String(s) if s.is_empty() => Err(tera::Error::msg(message)),
        _ => Ok(value.clone()),
    }
}

/// `required(message="...", value=...)`
///
/// A missing `value` argument counts as null.
pub fn required_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let message = message_arg(args)?;
    check_required(message, args.get("value").unwrap_or(&Value::Null))
}

/// `value | required(message="...")`
pub fn required_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let message = message_arg(args)?;
    check_required(message, value)
}

pub fn to_yaml_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let yaml = serde_yaml::to_string(value)
        .map_err(|e| tera::Error::msg(format!("toYaml: {}", e)))?;
    Ok(Value::String(yaml.trim_end_matches('\n').to_string()))
}

pub fn to_json_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let json = serde_json::to_string(value)
        .map_err(|e| tera::Error::msg(format!("toJson: {}", e)))?;
    Ok(Value::String(json))
}

fn spaces_arg(args: &HashMap<String, Value>) -> tera::Result<usize> {
    match args.get("spaces") {
        None => Ok(0),
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| tera::Error::msg("indent: `spaces` must be a non-negative integer")),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn indent_lines(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.split('\n').map(|line| format!("{}{}", pad, line)).collect::<Vec<_>>().join("\n")
}

/// `text | indent(spaces=N)`
pub fn indent_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let spaces = spaces_arg(args)?;
    Ok(Value::String(indent_lines(&as_text(value), spaces)))
}

/// `text | nindent(spaces=N)`
pub fn nindent_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let spaces = spaces_arg(args)?;
    Ok(Value::String(format!("\n{}", indent_lines(&as_text(value), spaces))))
}

pub fn quote_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = as_text(value).replace('\\', "\\\\").replace('"', "\\\"");
    Ok(Value::String(format!("\"{}\"", text)))
}

pub fn keys_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let map = value.as_object().ok_or_else(|| tera::Error::msg("keys filter requires a map"))?;
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    Ok(Value::Array(keys.into_iter().map(|k| Value::String(k.clone())).collect()))
}
