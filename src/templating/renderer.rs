//! Template rendering engine with Tera.
//!
//! This module provides the [`TemplateRenderer`] struct that wraps Tera with
//! CPM-specific configuration: the custom filter library, strict undefined
//! handling and structured errors that name the failing file.

use regex::Regex;
use std::error::Error as _;
use std::path::{Path, PathBuf};
use strsim::levenshtein;
use tera::ast::{Expr, ExprVal, FunctionCall, Node};
use tera::{Context as TeraContext, Tera};
use walkdir::WalkDir;

use super::error::{ErrorLocation, TemplateError};
use super::filters;
use crate::core::CpmError;
use crate::values::Values;

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// File suffixes that take part in rendering.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".json", ".yaml", ".tpl"];

/// Name of the package subdirectory holding the templates.
pub const TEMPLATES_DIR: &str = "templates";

/// Key under which values are exposed to templates.
pub const VALUES_KEY: &str = "Values";

const UTF8_BOM: &str = "\u{feff}";

/// Template renderer with Tera engine and custom functions.
///
/// Each template file is parsed and executed on its own, so one file's
/// definitions never leak into another. Output order follows the directory
/// walk: depth-first, entries of each directory visited by file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render every template of a package into a JSON array text.
    ///
    /// The result is `[` + outputs joined with `,` + `]`. The output is not
    /// parsed here; callers validate it.
    ///
    /// # Errors
    ///
    /// - [`CpmError::TemplatesNotFound`] when `package_dir/templates` is missing
    /// - [`CpmError::NoTemplates`] when no `.json`, `.yaml` or `.tpl` file exists
    /// - [`CpmError::Template`] for parse or execution failures, naming the file
    pub fn render(&self, package_dir: &Path, values: &Values) -> Result<String, CpmError> {
        let templates_dir = package_dir.join(TEMPLATES_DIR);
        if !templates_dir.is_dir() {
            return Err(CpmError::TemplatesNotFound {
                path: package_dir.display().to_string(),
            });
        }

        let mut context = TeraContext::new();
        context.insert(VALUES_KEY, values);

        let mut outputs = Vec::new();
        for file in collect_templates(&templates_dir)? {
            let relative = file
                .strip_prefix(&templates_dir)
                .unwrap_or(&file)
                .to_string_lossy()
                .replace('\\', "/");
            tracing::debug!("Rendering template {}", relative);

            let raw = std::fs::read_to_string(&file)?;
            let content = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);
            outputs.push(self.render_one(&relative, &file, content, &context, values)?);
        }

        if outputs.is_empty() {
            return Err(CpmError::NoTemplates {
                path: templates_dir.display().to_string(),
            });
        }

        tracing::debug!("Rendered {} template(s)", outputs.len());
        Ok(format!("[{}]", outputs.join(",")))
    }

    fn render_one(
        &self,
        name: &str,
        path: &Path,
        content: &str,
        context: &TeraContext,
        values: &Values,
    ) -> Result<String, TemplateError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        filters::register_all(&mut tera);

        tera.add_raw_template(name, content).map_err(|e| TemplateError::SyntaxError {
            message: Self::format_tera_error(&e),
            location: Self::build_error_location(name, path, &e),
        })?;

        let template = tera.get_template(name).map_err(|e| TemplateError::RenderFailed {
            message: Self::format_tera_error(&e),
            location: Self::build_error_location(name, path, &e),
        })?;
        if let Some(variable) = find_unresolved_reference(&template.ast, values) {
            let location = ErrorLocation {
                template: name.to_string(),
                file_path: path.to_path_buf(),
                line_number: None,
            };
            return Err(Self::variable_not_found(variable, location, values));
        }

        tera.render(name, context).map_err(|e| Self::parse_tera_error(&e, name, path, values))
    }

    fn variable_not_found(variable: String, location: ErrorLocation, values: &Values) -> TemplateError {
        let available_variables = Self::extract_available_variables(values);
        let suggestions = Self::find_similar_variables(&variable, &available_variables);
        TemplateError::VariableNotFound {
            variable,
            available_variables,
            suggestions,
            location,
        }
    }

    /// Parse a Tera render error into a structured [`TemplateError`]
    fn parse_tera_error(
        error: &tera::Error,
        name: &str,
        path: &Path,
        values: &Values,
    ) -> TemplateError {
        let location = Self::build_error_location(name, path, error);

        // The undefined-variable message sits somewhere in the source chain
        let mut current: Option<&dyn std::error::Error> = Some(error);
        while let Some(err) = current {
            if let Some(variable) = Self::extract_variable_name(&err.to_string()) {
                return Self::variable_not_found(variable, location, values);
            }
            current = err.source();
        }

        TemplateError::RenderFailed {
            message: Self::format_tera_error(error),
            location,
        }
    }

    /// Extract variable name from "Variable `foo` not found" message
    fn extract_variable_name(error_msg: &str) -> Option<String> {
        let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
        re.captures(error_msg).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
    }

    /// Dotted paths of every value, e.g. `Values.resources.cpu`
    fn extract_available_variables(values: &Values) -> Vec<String> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<String>) {
            out.push(prefix.to_string());
            if let serde_json::Value::Object(map) = value {
                for (key, child) in map {
                    walk(&format!("{}.{}", prefix, key), child, out);
                }
            }
        }

        let mut vars = Vec::new();
        for (key, value) in values {
            walk(&format!("{}.{}", VALUES_KEY, key), value, &mut vars);
        }
        vars
    }

    /// Find similar variable names using Levenshtein distance
    fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
        let mut scored: Vec<_> =
            available.iter().map(|var| (var.clone(), levenshtein(target, var))).collect();

        scored.sort_by_key(|(_, dist)| *dist);

        scored
            .into_iter()
            .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(3)
            .map(|(var, _)| var)
            .collect()
    }

    /// Tera includes line:column information in parse error messages.
    fn extract_line_from_tera_error(error: &tera::Error) -> Option<usize> {
        let error_msg = format!("{:?}", error);
        let re = Regex::new(r"(\d+):(\d+)").ok()?;
        re.captures(&error_msg)
            .and_then(|caps| caps.get(1))
            .and_then(|line| line.as_str().parse::<usize>().ok())
    }

    fn build_error_location(name: &str, path: &Path, error: &tera::Error) -> ErrorLocation {
        ErrorLocation {
            template: name.to_string(),
            file_path: path.to_path_buf(),
            line_number: Self::extract_line_from_tera_error(error),
        }
    }

    /// Collapse a Tera error chain into a single readable message.
    ///
    /// Wrapper messages like "Failed to render 'x'" are dropped; the file is
    /// already named by the error location.
    pub fn format_tera_error(error: &tera::Error) -> String {
        let mut messages = Vec::new();
        let mut current: Option<&dyn std::error::Error> = Some(error);
        while let Some(err) = current {
            let msg = err.to_string();
            let trimmed = msg.trim();
            if !trimmed.is_empty()
                && !trimmed.starts_with("Failed to render")
                && !trimmed.starts_with("Failed to parse")
            {
                messages.push(trimmed.to_string());
            }
            current = err.source();
        }

        if messages.is_empty() {
            error.to_string()
        } else {
            messages.join(": ")
        }
    }
}

/// First `Values.*` path in `nodes` that does not resolve against `values`.
///
/// Tera only fails on undefined variables in `{{ }}` output; conditions and
/// `default` treat them as falsy. Checking the AST up front makes every
/// reference strict. `is defined` / `is undefined` tests stay allowed.
fn find_unresolved_reference(nodes: &[Node], values: &Values) -> Option<String> {
    let mut idents = Vec::new();
    collect_nodes(nodes, &mut idents);
    idents.into_iter().find(|ident| !resolves(ident, values))
}

fn collect_nodes(nodes: &[Node], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::VariableBlock(_, expr) => collect_expr(expr, out),
            Node::Set(_, set) => collect_expr(&set.value, out),
            Node::MacroDefinition(_, definition, _) => {
                definition.args.values().flatten().for_each(|expr| collect_expr(expr, out));
                collect_nodes(&definition.body, out);
            }
            Node::FilterSection(_, section, _) => {
                collect_call(&section.filter, out);
                collect_nodes(&section.body, out);
            }
            Node::Block(_, block, _) => collect_nodes(&block.body, out),
            Node::Forloop(_, forloop, _) => {
                collect_expr(&forloop.container, out);
                collect_nodes(&forloop.body, out);
                if let Some(empty_body) = &forloop.empty_body {
                    collect_nodes(empty_body, out);
                }
            }
            Node::If(branches, _) => {
                for (_, condition, body) in &branches.conditions {
                    collect_expr(condition, out);
                    collect_nodes(body, out);
                }
                if let Some((_, body)) = &branches.otherwise {
                    collect_nodes(body, out);
                }
            }
            _ => {}
        }
    }
}

fn collect_expr(expr: &Expr, out: &mut Vec<String>) {
    collect_val(&expr.val, out);
    expr.filters.iter().for_each(|filter| collect_call(filter, out));
}

fn collect_call(call: &FunctionCall, out: &mut Vec<String>) {
    call.args.values().for_each(|arg| collect_expr(arg, out));
}

fn collect_val(val: &ExprVal, out: &mut Vec<String>) {
    match val {
        ExprVal::Ident(ident) => out.push(ident.clone()),
        ExprVal::Math(math) => {
            collect_expr(&math.lhs, out);
            collect_expr(&math.rhs, out);
        }
        ExprVal::Logic(logic) => {
            collect_expr(&logic.lhs, out);
            collect_expr(&logic.rhs, out);
        }
        ExprVal::In(contains) => {
            collect_expr(&contains.lhs, out);
            collect_expr(&contains.rhs, out);
        }
        ExprVal::Test(test) => {
            if test.name != "defined" && test.name != "undefined" {
                out.push(test.ident.clone());
            }
            test.args.iter().for_each(|arg| collect_expr(arg, out));
        }
        ExprVal::FunctionCall(call) => collect_call(call, out),
        ExprVal::MacroCall(call) => call.args.values().for_each(|arg| collect_expr(arg, out)),
        ExprVal::Array(items) => items.iter().for_each(|item| collect_expr(item, out)),
        ExprVal::StringConcat(concat) => concat.values.iter().for_each(|v| collect_val(v, out)),
        ExprVal::String(_) | ExprVal::Int(_) | ExprVal::Float(_) | ExprVal::Bool(_) => {}
    }
}

/// Whether a dotted identifier resolves. Non-`Values` identifiers and
/// bracket lookups are left to Tera.
fn resolves(ident: &str, values: &Values) -> bool {
    let Some(rest) = ident.strip_prefix(VALUES_KEY) else {
        return true;
    };
    let Some(path) = rest.strip_prefix('.') else {
        return true;
    };
    if path.contains('[') {
        return true;
    }

    let mut segments = path.split('.');
    let Some(mut current) = segments.next().and_then(|first| values.get(first)) else {
        return false;
    };
    for segment in segments {
        let next = match current {
            serde_json::Value::Object(map) => map.get(segment),
            serde_json::Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return false,
        }
    }
    true
}

/// Recognized template files under `templates_dir` in walk order.
fn collect_templates(templates_dir: &Path) -> Result<Vec<PathBuf>, CpmError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(templates_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CpmError::IoError(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if TEMPLATE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn values(v: serde_json::Value) -> Values {
        v.as_object().cloned().unwrap()
    }

    fn package(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        let templates = temp.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        for (name, content) in files {
            let path = templates.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp
    }

    #[test]
    fn test_render_single_template() {
        let pkg = package(&[("w.json", r#"{"env": "{{ Values.environment | upper }}"}"#)]);
        let out = TemplateRenderer::new()
            .render(pkg.path(), &values(json!({"environment": "prod"})))
            .unwrap();
        assert_eq!(out, r#"[{"env": "PROD"}]"#);
    }

    #[test]
    fn test_two_templates_in_name_order() {
        let pkg = package(&[("b.json", r#"{"n": 2}"#), ("a.json", r#"{"n": 1}"#)]);
        let out = TemplateRenderer::new().render(pkg.path(), &Values::new()).unwrap();
        assert_eq!(out, r#"[{"n": 1},{"n": 2}]"#);
    }

    #[test]
    fn test_walk_is_depth_first_not_global_sort() {
        // "a/z.json" comes before "a.json" in a depth-first walk ("a" < "a.json")
        let pkg = package(&[("a.json", "1"), ("a/z.json", "2"), ("b.tpl", "3")]);
        let out = TemplateRenderer::new().render(pkg.path(), &Values::new()).unwrap();
        assert_eq!(out, "[2,1,3]");
    }

    #[test]
    fn test_unrecognized_files_ignored() {
        let pkg = package(&[("notes.md", "{{ broken"), ("w.yaml", "{}")]);
        let out = TemplateRenderer::new().render(pkg.path(), &Values::new()).unwrap();
        assert_eq!(out, "[{}]");
    }

    #[test]
    fn test_bom_is_stripped() {
        let pkg = package(&[("w.json", "\u{feff}{\"a\": 1}")]);
        let out = TemplateRenderer::new().render(pkg.path(), &Values::new()).unwrap();
        assert_eq!(out, r#"[{"a": 1}]"#);
    }

    #[test]
    fn test_missing_templates_dir() {
        let temp = TempDir::new().unwrap();
        let err = TemplateRenderer::new().render(temp.path(), &Values::new()).unwrap_err();
        assert!(matches!(err, CpmError::TemplatesNotFound { .. }));
        assert!(err.to_string().contains("templates directory not found"));
    }

    #[test]
    fn test_no_templates() {
        let pkg = package(&[("README.md", "hi")]);
        let err = TemplateRenderer::new().render(pkg.path(), &Values::new()).unwrap_err();
        assert!(matches!(err, CpmError::NoTemplates { .. }));
        assert!(err.to_string().contains("no templates found"));
    }

    #[test]
    fn test_undefined_key_is_error_naming_file() {
        let pkg = package(&[("w.json", r#"{"x": "{{ Values.missing }}"}"#)]);
        let err = TemplateRenderer::new()
            .render(pkg.path(), &values(json!({"missinG": 1})))
            .unwrap_err();
        match err {
            CpmError::Template(TemplateError::VariableNotFound {
                variable,
                suggestions,
                location,
                ..
            }) => {
                assert_eq!(variable, "Values.missing");
                assert_eq!(suggestions, vec!["Values.missinG".to_string()]);
                assert_eq!(location.template, "w.json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_required_message_surfaces() {
        let pkg = package(&[("w.json", r#"{{ Values.x | required(message="x is mandatory") }}"#)]);
        let err = TemplateRenderer::new()
            .render(pkg.path(), &values(json!({"x": ""})))
            .unwrap_err();
        assert!(matches!(err, CpmError::Template(TemplateError::RenderFailed { .. })));
        assert!(err.to_string().contains("x is mandatory"));
    }

    #[test]
    fn test_syntax_error_names_file() {
        let pkg = package(&[("broken.tpl", "{{ Values.x ")]);
        let err = TemplateRenderer::new().render(pkg.path(), &Values::new()).unwrap_err();
        assert!(matches!(err, CpmError::Template(TemplateError::SyntaxError { .. })));
        assert!(err.to_string().contains("broken.tpl"));
    }

    #[test]
    fn test_json_text_is_not_escaped() {
        let pkg = package(&[("w.json", r#"{"q": {{ Values.s | quote }} }"#)]);
        let out = TemplateRenderer::new()
            .render(pkg.path(), &values(json!({"s": "<a&b>"})))
            .unwrap();
        assert_eq!(out, r#"[{"q": "<a&b>" }]"#);
    }

    #[test]
    fn test_undefined_key_in_condition_is_error() {
        let pkg = package(&[("w.json", r#"{% if Values.missing %}{"a":1}{% else %}{"b":2}{% endif %}"#)]);
        let err = TemplateRenderer::new().render(pkg.path(), &Values::new()).unwrap_err();
        assert!(matches!(
            err,
            CpmError::Template(TemplateError::VariableNotFound { ref variable, .. }) if variable == "Values.missing"
        ));
    }

    #[test]
    fn test_default_filter_does_not_hide_undefined_key() {
        let pkg = package(&[("w.json", r#"{"n": {{ Values.replica | default(value=1) }}}"#)]);
        let err = TemplateRenderer::new()
            .render(pkg.path(), &values(json!({"replicas": 3})))
            .unwrap_err();
        match err {
            CpmError::Template(TemplateError::VariableNotFound {
                variable,
                suggestions,
                ..
            }) => {
                assert_eq!(variable, "Values.replica");
                assert_eq!(suggestions, vec!["Values.replicas".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nested_and_loop_references_resolve() {
        let pkg = package(&[(
            "w.json",
            r#"{"cpu": "{{ Values.resources.cpu }}", "first": "{{ Values.nodes.0 }}", "all": [{% for n in Values.nodes %}"{{ n }}"{% if not loop.last %},{% endif %}{% endfor %}]{% if Values.gpu is defined %}, "gpu": true{% endif %}}"#,
        )]);
        let out = TemplateRenderer::new()
            .render(pkg.path(), &values(json!({"resources": {"cpu": "1000m"}, "nodes": ["a", "b"]})))
            .unwrap();
        assert_eq!(out, r#"[{"cpu": "1000m", "first": "a", "all": ["a","b"]}]"#);
    }

    #[test]
    fn test_unresolved_nested_path() {
        let pkg = package(&[("w.json", r#"{% set cpu = Values.resources.gpu %}{}"#)]);
        let err = TemplateRenderer::new()
            .render(pkg.path(), &values(json!({"resources": {"cpu": "1000m"}})))
            .unwrap_err();
        assert!(err.to_string().contains("Values.resources.gpu"));
    }
}
