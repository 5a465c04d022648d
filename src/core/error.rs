//! Error handling for CPM
//!
//! This module provides the typed error enum used at the leaves of every CPM
//! operation and the user-friendly error reporting used by the CLI. The error
//! system follows two rules:
//! 1. **Strongly-typed errors** for precise handling in code and tests
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`CpmError`] - Enumerated error types for all failure cases in CPM
//! - [`ErrorCategory`] - The five-way taxonomy every variant maps onto
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! Functions throughout the crate return [`anyhow::Result`] and attach stage
//! context with `.with_context(..)`. The typed [`CpmError`] stays reachable
//! through the context chain, so callers can still match on it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cpm_cli::core::{CpmError, ErrorCategory, user_friendly_error};
//!
//! let error = CpmError::ReleaseNotFound {
//!     name: "demo".to_string(),
//! };
//! assert_eq!(error.category(), ErrorCategory::NotFound);
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::templating::TemplateError;

/// Coarse classification of a [`CpmError`].
///
/// Every variant belongs to exactly one category. Variants without a dedicated
/// hint get a suggestion picked by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input: empty names, missing manifest fields, malformed descriptors
    Validation,
    /// A release, artifact or registry entry does not exist
    NotFound,
    /// Filesystem or archive failures
    Io,
    /// Template parse/execution failures and rendered-output problems
    Template,
    /// The execution platform rejected a document or could not be reached
    Submission,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::NotFound => "not found",
            Self::Io => "io",
            Self::Template => "template",
            Self::Submission => "submission",
        };
        f.write_str(name)
    }
}

/// The main error type for CPM operations
///
/// # Error Categories
///
/// ## Validation
/// - [`Validation`] - Generic input validation failure
/// - [`ManifestParseError`] - `colony.yaml` is not valid YAML or has wrong types
/// - [`ValuesParseError`] - `values.yaml` is malformed or not a mapping
/// - [`ConfigError`] - `config.toml` or flag combination is invalid
///
/// ## Not Found
/// - [`ManifestNotFound`] - No `colony.yaml` at the package root
/// - [`ReleaseNotFound`] - No release with that name in the state store
/// - [`ArtifactNotFound`] - Registry has no `{name}-{version}.cpm`
///
/// ## I/O
/// - [`IoError`] - Standard I/O errors from [`std::io::Error`]
/// - [`UnsafeArchiveEntry`] - Archive entry would escape the destination
///
/// ## Template
/// - [`TemplatesNotFound`] - Package has no `templates/` directory
/// - [`NoTemplates`] - `templates/` has no `.json`, `.yaml` or `.tpl` file
/// - [`Template`] - A template failed to parse or render
/// - [`InvalidRenderedOutput`] - Rendered output is not a JSON array of objects
///
/// ## Submission
/// - [`SubmissionFailed`] - Submitter rejected a document
///
/// [`Validation`]: CpmError::Validation
/// [`ManifestParseError`]: CpmError::ManifestParseError
/// [`ValuesParseError`]: CpmError::ValuesParseError
/// [`ConfigError`]: CpmError::ConfigError
/// [`ManifestNotFound`]: CpmError::ManifestNotFound
/// [`ReleaseNotFound`]: CpmError::ReleaseNotFound
/// [`ArtifactNotFound`]: CpmError::ArtifactNotFound
/// [`IoError`]: CpmError::IoError
/// [`UnsafeArchiveEntry`]: CpmError::UnsafeArchiveEntry
/// [`TemplatesNotFound`]: CpmError::TemplatesNotFound
/// [`NoTemplates`]: CpmError::NoTemplates
/// [`Template`]: CpmError::Template
/// [`InvalidRenderedOutput`]: CpmError::InvalidRenderedOutput
/// [`SubmissionFailed`]: CpmError::SubmissionFailed
#[derive(Error, Debug)]
pub enum CpmError {
    /// Input failed validation (empty package name, missing version, ...)
    #[error("Validation failed: {reason}")]
    Validation {
        /// Why the input was rejected
        reason: String,
    },

    #[error("Invalid manifest file syntax in {file}")]
    ManifestParseError {
        /// Path to the manifest file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    #[error("Invalid values file {file}: {reason}")]
    ValuesParseError {
        /// Path to the values file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    #[error("Manifest file colony.yaml not found in {path}")]
    ManifestNotFound {
        /// Package directory that was searched
        path: String,
    },

    #[error("Release {name} not found")]
    ReleaseNotFound {
        /// Name of the release that is not recorded
        name: String,
    },

    #[error("Package {name} version {version} not found in registry")]
    ArtifactNotFound {
        /// Package name requested from the registry
        name: String,
        /// Package version requested from the registry
        version: String,
    },

    #[error("Archive entry '{path}' escapes the extraction directory")]
    UnsafeArchiveEntry {
        /// Entry path as stored in the archive
        path: String,
    },

    #[error("templates directory not found in {path}")]
    TemplatesNotFound {
        /// Package directory that has no templates/ subdirectory
        path: String,
    },

    #[error("no templates found in {path}")]
    NoTemplates {
        /// Templates directory that has no recognized files
        path: String,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to parse rendered templates as JSON: {reason}\nOutput: {output}")]
    InvalidRenderedOutput {
        /// Parser error message
        reason: String,
        /// The raw rendered text, kept for diagnosis
        output: String,
    },

    #[error("Submission of document {index} failed: {reason}")]
    SubmissionFailed {
        /// Zero-based position of the document in the rendered array
        index: usize,
        /// Collaborator error message
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl CpmError {
    /// Map this error onto the five-way taxonomy.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation {
                ..
            }
            | Self::ManifestParseError {
                ..
            }
            | Self::ValuesParseError {
                ..
            }
            | Self::ConfigError {
                ..
            }
            | Self::Other {
                ..
            } => ErrorCategory::Validation,
            Self::ManifestNotFound {
                ..
            }
            | Self::ReleaseNotFound {
                ..
            }
            | Self::ArtifactNotFound {
                ..
            } => ErrorCategory::NotFound,
            Self::IoError(_)
            | Self::UnsafeArchiveEntry {
                ..
            } => ErrorCategory::Io,
            Self::TemplatesNotFound {
                ..
            }
            | Self::NoTemplates {
                ..
            }
            | Self::Template(_)
            | Self::InvalidRenderedOutput {
                ..
            } => ErrorCategory::Template,
            Self::SubmissionFailed {
                ..
            } => ErrorCategory::Submission,
        }
    }

    /// Shorthand for a [`CpmError::Validation`] error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Find the first [`CpmError`] in an [`anyhow::Error`] chain.
    ///
    /// Stage context added with `.with_context(..)` sits on top of the typed
    /// error; this walks past it.
    #[must_use]
    pub fn find_in(error: &anyhow::Error) -> Option<&Self> {
        error.chain().find_map(|cause| cause.downcast_ref::<Self>())
    }
}

impl Clone for CpmError {
    fn clone(&self) -> Self {
        match self {
            Self::Validation {
                reason,
            } => Self::Validation {
                reason: reason.clone(),
            },
            Self::ManifestParseError {
                file,
                reason,
            } => Self::ManifestParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ValuesParseError {
                file,
                reason,
            } => Self::ValuesParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::ManifestNotFound {
                path,
            } => Self::ManifestNotFound {
                path: path.clone(),
            },
            Self::ReleaseNotFound {
                name,
            } => Self::ReleaseNotFound {
                name: name.clone(),
            },
            Self::ArtifactNotFound {
                name,
                version,
            } => Self::ArtifactNotFound {
                name: name.clone(),
                version: version.clone(),
            },
            Self::UnsafeArchiveEntry {
                path,
            } => Self::UnsafeArchiveEntry {
                path: path.clone(),
            },
            Self::TemplatesNotFound {
                path,
            } => Self::TemplatesNotFound {
                path: path.clone(),
            },
            Self::NoTemplates {
                path,
            } => Self::NoTemplates {
                path: path.clone(),
            },
            Self::Template(e) => Self::Template(e.clone()),
            Self::InvalidRenderedOutput {
                reason,
                output,
            } => Self::InvalidRenderedOutput {
                reason: reason.clone(),
                output: output.clone(),
            },
            Self::SubmissionFailed {
                index,
                reason,
            } => Self::SubmissionFailed {
                index: *index,
                reason: reason.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// # Examples
///
/// ```rust,no_run
/// use cpm_cli::core::{CpmError, ErrorContext};
///
/// let context = ErrorContext::new(CpmError::ReleaseNotFound { name: "demo".into() })
///     .with_suggestion("Run 'cpm list' to see installed packages")
///     .with_details("Releases are recorded in CPM_HOME/state.json");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying CPM error
    pub error: CpmError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`CpmError`]
    #[must_use]
    pub const fn new(error: CpmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    ///
    /// Suggestions are displayed in green in the terminal.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    ///
    /// Details are displayed in yellow in the terminal.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// The wrapped stage context (e.g. "render failed") is kept in the message so
/// the user sees which pipeline step broke, followed by the causal chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format_chain(&error);

    if let Some(cpm_error) = CpmError::find_in(&error) {
        let ctx = create_error_context(cpm_error.clone());
        // Keep the outer stage context when the typed error is nested
        let outermost_is_typed =
            error.chain().next().is_some_and(|e| e.downcast_ref::<CpmError>().is_some());
        if !outermost_is_typed {
            return ErrorContext {
                error: CpmError::Other {
                    message,
                },
                ..ctx
            };
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(CpmError::Other {
                    message,
                })
                .with_suggestion("Check file ownership and permissions of CPM_HOME and the package directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(CpmError::Other {
                    message,
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    ErrorContext::new(CpmError::Other {
        message,
    })
}

/// Render an error and its causes as a single message.
fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

/// Create appropriate [`ErrorContext`] with suggestions for specific CPM errors
fn create_error_context(error: CpmError) -> ErrorContext {
    match &error {
        CpmError::ManifestNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'cpm init <name>' to scaffold a package, or pass the package directory")
            .with_details("Pack and publish read the package identity from colony.yaml at the package root"),

        CpmError::ManifestParseError {
            reason,
            ..
        } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check the YAML syntax of colony.yaml; name and version must be strings")
        }

        CpmError::ValuesParseError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("values.yaml must contain a single YAML mapping at the top level"),

        CpmError::ReleaseNotFound {
            ..
        } => ErrorContext::new(error).with_suggestion("Run 'cpm list' to see installed packages"),

        CpmError::ArtifactNotFound {
            name,
            ..
        } => {
            let suggestion = format!("Run 'cpm search {name}' to see the published versions");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        CpmError::UnsafeArchiveEntry {
            ..
        } => ErrorContext::new(error)
            .with_details("Archive entries must be relative paths that stay inside the package root")
            .with_suggestion("Re-create the artifact with 'cpm pack' from a trusted package directory"),

        CpmError::TemplatesNotFound {
            ..
        }
        | CpmError::NoTemplates {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Add at least one .json, .yaml or .tpl file under the package's templates/ directory"),

        CpmError::Template(template_error) => {
            let details = template_error.format_with_context();
            ErrorContext::new(error).with_details(details).with_suggestion(
                "Check template syntax: variables use {{ Values.key }}, control flow uses {% %}. \
                 Every referenced key must exist in values.yaml or be passed with --set",
            )
        }

        CpmError::InvalidRenderedOutput {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Each template must render to exactly one JSON object"),

        CpmError::SubmissionFailed {
            ..
        } => ErrorContext::new(error)
            .with_details("Documents submitted before the failure were not rolled back")
            .with_suggestion("Check the ColonyOS host, port, colony id and private key"),

        CpmError::ConfigError {
            ..
        } => ErrorContext::new(error).with_suggestion("Check CPM_HOME/config.toml and the command-line flags"),

        _ => match error.category() {
            ErrorCategory::Io => ErrorContext::new(error)
                .with_suggestion("Check that the paths exist and that CPM_HOME is writable"),
            ErrorCategory::Validation => {
                ErrorContext::new(error).with_suggestion("Run the command with --help to check its arguments")
            }
            _ => ErrorContext::new(error),
        },
    }
}
