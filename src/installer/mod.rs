//! Package installation pipeline.
//!
//! [`Installer::install`] turns a package reference into submitted documents
//! and a recorded release:
//!
//! 1. **Resolve source**: a local directory or artifact, or (when nothing
//!    exists at that path) a registry package name fetched at the requested
//!    version
//! 2. **Stage**: an artifact is unpacked into a scoped `cpm-install-*`
//!    directory; a directory is used in place
//! 3. **Resolve values**: `values.yaml` defaults merged with overrides
//! 4. **Render**: every template under `templates/`
//! 5. **Assemble**: parse the rendered output as a JSON array of objects
//! 6. **Submit**: each object, in order, as pretty-printed JSON; the first
//!    failure aborts and earlier submissions stay submitted
//! 7. **Derive identity**: the release name, version and colony id
//! 8. **Persist**: upsert the release; a failure here is only a warning
//!
//! Download and staging directories are owned by [`TempDir`] guards and are
//! removed on every exit path.


use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::archive;
use crate::colony::Submitter;
use crate::constants::{PLACEHOLDER_RELEASE_VERSION, UNKNOWN_RELEASE_NAME};
use crate::core::CpmError;
use crate::registry::{FetchedArtifact, Registry};
use crate::state::{Release, ReleaseStore};
use crate::templating::TemplateRenderer;
use crate::values::{Values, load_values, merge};

/// A rendered document: one element of the rendered JSON array.
pub type Spec = Map<String, Value>;

/// What to install, built once per invocation.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Package directory, artifact path, or registry package name
    pub source: String,
    /// Required when `source` is fetched from the registry
    pub version: Option<String>,
    /// Values that replace top-level defaults
    pub overrides: Values,
}

/// Result of a successful install
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub release: Release,
    /// Number of documents accepted by the submitter
    pub submitted: usize,
    /// Set when the release could not be recorded
    pub state_warning: Option<String>,
}

/// Where the package came from; keeps any download directory alive.
enum ResolvedSource {
    Local(PathBuf),
    Fetched(FetchedArtifact),
}

impl ResolvedSource {
    fn path(&self) -> &Path {
        match self {
            Self::Local(path) => path,
            Self::Fetched(artifact) => artifact.path(),
        }
    }
}

/// The package tree templates are rendered from.
enum WorkDir {
    InPlace(PathBuf),
    Unpacked(TempDir),
}

impl WorkDir {
    fn path(&self) -> &Path {
        match self {
            Self::InPlace(path) => path,
            Self::Unpacked(dir) => dir.path(),
        }
    }
}

/// Runs the install pipeline against a submitter, a registry and a store.
pub struct Installer<'a, S, R> {
    submitter: S,
    registry: &'a R,
    store: &'a ReleaseStore,
    renderer: TemplateRenderer,
}

impl<'a, S: Submitter, R: Registry> Installer<'a, S, R> {
    pub fn new(submitter: S, registry: &'a R, store: &'a ReleaseStore) -> Self {
        Self {
            submitter,
            registry,
            store,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Install one package.
    ///
    /// # Errors
    ///
    /// - [`CpmError::Validation`] when a registry fetch has no version
    /// - [`CpmError::ArtifactNotFound`] when the registry has no such artifact
    /// - [`CpmError::ValuesParseError`] for malformed `values.yaml`
    /// - template errors from rendering, wrapped in "render failed"
    /// - [`CpmError::InvalidRenderedOutput`] when the output is not a JSON
    ///   array of objects
    /// - [`CpmError::SubmissionFailed`] on the first rejected document
    ///
    /// Failing to record the release is not an error; see
    /// [`InstallOutcome::state_warning`].
    pub async fn install(&self, options: InstallOptions) -> Result<InstallOutcome> {
        let source = self.resolve_source(&options)?;
        let work = stage(source.path())?;
        debug!(work_dir = %work.path().display(), "Package staged");

        let defaults = load_values(work.path()).context("Failed to load values")?;
        let values = merge(defaults, &options.overrides);

        let rendered = self.renderer.render(work.path(), &values).context("render failed")?;
        let specs = assemble_specs(&rendered)?;
        debug!(count = specs.len(), "Rendered documents assembled");

        let submitted = self.submit_all(&specs).await?;

        let release = derive_release(&specs, &options.overrides);
        let state_warning = match self.store.save(release.clone()) {
            Ok(()) => None,
            Err(e) => {
                let message = format!("failed to save state: {e:#}");
                warn!("{}", message);
                Some(message)
            }
        };

        Ok(InstallOutcome {
            release,
            submitted,
            state_warning,
        })
    }

    fn resolve_source(&self, options: &InstallOptions) -> Result<ResolvedSource> {
        let path = PathBuf::from(&options.source);
        if path.exists() {
            return Ok(ResolvedSource::Local(path));
        }

        info!("Package {} not found locally, attempting fetch from registry", options.source);
        let version = options.version.as_deref().filter(|v| !v.is_empty()).ok_or_else(|| {
            CpmError::validation(format!(
                "version is required when installing '{}' from the registry",
                options.source
            ))
        })?;

        let artifact = self
            .registry
            .fetch(&options.source, version)
            .context("Failed to fetch from registry")?;
        Ok(ResolvedSource::Fetched(artifact))
    }

    async fn submit_all(&self, specs: &[Spec]) -> Result<usize> {
        for (index, spec) in specs.iter().enumerate() {
            let document = serde_json::to_vec_pretty(spec).context("Failed to serialize document")?;
            self.submitter.submit_workflow(&document).await.map_err(|e| CpmError::SubmissionFailed {
                index,
                reason: format!("{e:#}"),
            })?;
            info!(index, bytes = document.len(), "Document submitted");
        }
        Ok(specs.len())
    }
}

/// Use a directory in place; unpack anything else into a scoped directory.
fn stage(path: &Path) -> Result<WorkDir> {
    if path.is_dir() {
        return Ok(WorkDir::InPlace(path.to_path_buf()));
    }

    let dir = tempfile::Builder::new()
        .prefix("cpm-install-")
        .tempdir()
        .context("Failed to create staging directory")?;
    archive::unpack(path, dir.path()).context("Failed to unpack archive")?;
    Ok(WorkDir::Unpacked(dir))
}

/// Parse the rendered output as a JSON array of objects.
pub fn assemble_specs(rendered: &str) -> Result<Vec<Spec>, CpmError> {
    serde_json::from_str(rendered).map_err(|e| CpmError::InvalidRenderedOutput {
        reason: e.to_string(),
        output: rendered.to_string(),
    })
}

/// Release identity for a set of submitted documents.
///
/// The name is the `name` override when it is a string, else the `name` of the
/// last document that has a string one, else `unknown`. The colony id is the
/// last string `colonyId`, else empty. The version is a fixed placeholder.
pub fn derive_release(specs: &[Spec], overrides: &Values) -> Release {
    let mut last_name = "";
    let mut last_colony_id = "";
    for spec in specs {
        if let Some(name) = spec.get("name").and_then(Value::as_str) {
            last_name = name;
        }
        if let Some(colony_id) = spec.get("colonyId").and_then(Value::as_str) {
            last_colony_id = colony_id;
        }
    }

    let name = match overrides.get("name").and_then(Value::as_str) {
        Some(name) => name,
        None if !last_name.is_empty() => last_name,
        None => UNKNOWN_RELEASE_NAME,
    };

    Release::new(name, PLACEHOLDER_RELEASE_VERSION, last_colony_id)
}
