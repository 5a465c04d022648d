//! Template error handling for CPM
//!
//! This module provides structured error types for template rendering with
//! the file name, the failing variable and close-match suggestions.

use std::path::PathBuf;

/// Template errors with detailed context
#[derive(Debug, Clone)]
pub enum TemplateError {
    /// A template referenced a value that does not exist
    VariableNotFound {
        variable: String,
        available_variables: Vec<String>,
        suggestions: Vec<String>,
        location: ErrorLocation,
    },

    /// A template could not be parsed
    SyntaxError {
        message: String,
        location: ErrorLocation,
    },

    /// Execution failed for any other reason (filter/function errors, type errors)
    RenderFailed {
        message: String,
        location: ErrorLocation,
    },
}

/// Location information for template errors
#[derive(Debug, Clone)]
pub struct ErrorLocation {
    /// Template path relative to the templates directory
    pub template: String,
    /// Full path of the template file
    pub file_path: PathBuf,
    /// Line number if available from Tera
    pub line_number: Option<usize>,
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::VariableNotFound {
                variable,
                location,
                ..
            } => {
                write!(
                    f,
                    "failed to render template {}: variable not found: '{}'",
                    location.file_path.display(),
                    variable
                )
            }
            TemplateError::SyntaxError {
                message,
                location,
            } => {
                write!(f, "failed to parse template {}: {}", location.file_path.display(), message)
            }
            TemplateError::RenderFailed {
                message,
                location,
            } => {
                write!(f, "failed to render template {}: {}", location.file_path.display(), message)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

impl TemplateError {
    /// Generate user-friendly error message with context and suggestions
    pub fn format_with_context(&self) -> String {
        match self {
            TemplateError::VariableNotFound {
                variable,
                available_variables,
                suggestions,
                location,
            } => format_variable_not_found_error(variable, available_variables, suggestions, location),
            TemplateError::SyntaxError {
                message,
                location,
            } => format_syntax_error(message, location),
            TemplateError::RenderFailed {
                message,
                location,
            } => {
                let mut msg = String::new();
                msg.push_str("ERROR: Template Rendering Failed\n\n");
                msg.push_str(&format!("Error: {}\n", message));
                msg.push_str(&format!("Template: {}\n", location.template));
                msg
            }
        }
    }
}

/// Format a detailed "variable not found" error message
fn format_variable_not_found_error(
    variable: &str,
    available_variables: &[String],
    suggestions: &[String],
    location: &ErrorLocation,
) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Variable Not Found\n\n");
    msg.push_str(&format!("Variable: {}\n", variable));

    if let Some(line) = location.line_number {
        msg.push_str(&format!("Line: {}\n", line));
    }

    msg.push_str(&format!("Template: {}\n\n", location.template));

    if !suggestions.is_empty() {
        msg.push_str("Did you mean one of these?\n");
        for suggestion in suggestions {
            msg.push_str(&format!("  - {}\n", suggestion));
        }
        msg.push('\n');
    }

    if !available_variables.is_empty() {
        msg.push_str("Available values:\n");
        for var in available_variables.iter().take(10) {
            msg.push_str(&format!("  {}\n", var));
        }
        if available_variables.len() > 10 {
            msg.push_str(&format!("  ... and {} more\n", available_variables.len() - 10));
        }
        msg.push('\n');
    }

    msg.push_str("SUGGESTION: Define the key in values.yaml or pass it with --set key=value.\n");

    msg
}

/// Format syntax error
fn format_syntax_error(message: &str, location: &ErrorLocation) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Syntax Error\n\n");
    msg.push_str(&format!("Error: {}\n", message));
    msg.push_str(&format!("Template: {}\n", location.template));

    if let Some(line) = location.line_number {
        msg.push_str(&format!("Line: {}\n", line));
    }

    msg.push_str("\nSUGGESTION: Check template syntax for unclosed tags or invalid expressions.\n");
    msg.push_str("Common issues:\n");
    msg.push_str("  - Unclosed {{ }} or {% %} delimiters\n");
    msg.push_str("  - Invalid filter names\n");
    msg.push_str("  - Missing quotes around string values\n");

    msg
}
