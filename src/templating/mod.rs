//! Template rendering for CPM packages.
//!
//! Every file under a package's `templates/` directory whose name ends in
//! `.json`, `.yaml` or `.tpl` is a Tera template. Templates are rendered one by
//! one against a context holding a single key, `Values`, which maps to the
//! merged package values. The outputs are joined into a JSON array text:
//!
//! ```text
//! [<output of file 1>,<output of file 2>,...]
//! ```
//!
//! # Syntax
//!
//! Templates use Tera's Jinja2-like syntax:
//!
//! ```text
//! {
//!   "name": "{{ Values.name }}",
//!   "env": "{{ Values.environment | upper }}",
//!   "replicas": {{ Values.replicas }}
//!   {% if Values.gpu is defined %}, "gpu": true{% endif %}
//! }
//! ```
//!
//! # Strict Rendering
//!
//! A reference to a key that is not in the values is a hard error, never an
//! empty string. This holds in conditions and under `default` too; only the
//! `is defined` and `is undefined` tests may name a missing key. The error names the template file, the missing variable and
//! close matches from the available values.
//!
//! # Custom Helpers
//!
//! See [`filters`] for `required`, `toYaml`, `toJson`, `indent`, `nindent`,
//! `quote` and `keys`.

pub mod error;
pub mod filters;
pub mod renderer;

pub use error::{ErrorLocation, TemplateError};
pub use renderer::{TEMPLATE_EXTENSIONS, TEMPLATES_DIR, TemplateRenderer};
