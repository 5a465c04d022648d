//! Package lifecycle operations behind `init`, `pack`, `publish`,
//! `uninstall` and `list`.
//!
//! A package directory looks like:
//!
//! ```text
//! demo/
//! ├── colony.yaml      # identity: name, version, maintainers
//! ├── values.yaml      # default template values
//! ├── README.md
//! └── templates/       # *.json, *.yaml, *.tpl
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::archive;
use crate::core::CpmError;
use crate::manifest::ColonyManifest;
use crate::registry::Registry;
use crate::state::{Release, ReleaseStore};
use crate::utils::fs::safe_write;
use crate::values::VALUES_FILE;

const DEFAULT_VALUES: &str = "replicas: 1\nresources:\n  cpu: 1000m\n  mem: 512Mi\n";

/// Scaffold a new package at `parent/name`.
///
/// # Errors
///
/// [`CpmError::Validation`] for an empty name, a name with path separators, or
/// an existing target directory.
pub fn init_package(parent: &Path, name: &str) -> Result<PathBuf> {
    if name.trim().is_empty() {
        return Err(CpmError::validation("package name cannot be empty").into());
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(CpmError::validation(format!("invalid package name '{}'", name)).into());
    }

    let dir = parent.join(name);
    if dir.exists() {
        return Err(CpmError::validation(format!("directory {} already exists", dir.display())).into());
    }

    std::fs::create_dir_all(dir.join("templates"))
        .with_context(|| format!("Failed to create package directory: {}", dir.display()))?;

    let manifest = ColonyManifest::scaffold(name);
    manifest.save(&dir)?;
    safe_write(&dir.join(VALUES_FILE), DEFAULT_VALUES)?;
    safe_write(
        &dir.join("README.md"),
        &format!("# {}\n\nDescription: {}\n", name, manifest.description),
    )?;

    tracing::info!("Initialized package {} at {}", name, dir.display());
    Ok(dir)
}

/// Pack the package in `dir` into `output_dir/{name}-{version}.cpm`.
pub fn pack_package(dir: &Path, output_dir: &Path) -> Result<PathBuf> {
    let manifest = ColonyManifest::load(dir).context("Failed to load manifest")?;
    manifest.validate()?;
    archive::pack(dir, &manifest.name, &manifest.version, output_dir)
        .context("Failed to pack package")
}

/// Pack the package in `dir` to a scratch directory and publish it.
///
/// Returns the published manifest so callers can report name and version.
pub fn publish_package(dir: &Path, registry: &impl Registry) -> Result<ColonyManifest> {
    let manifest = ColonyManifest::load(dir).context("Failed to load manifest")?;
    manifest.validate()?;

    let scratch = tempfile::Builder::new()
        .prefix("cpm-publish-")
        .tempdir()
        .context("Failed to create scratch directory")?;
    let artifact = archive::pack(dir, &manifest.name, &manifest.version, scratch.path())
        .context("Failed to pack package")?;
    registry.publish(&artifact).context("Failed to publish package")?;

    Ok(manifest)
}

/// Forget an installed release.
///
/// # Errors
///
/// [`CpmError::ReleaseNotFound`] when nothing by that name is installed.
pub fn uninstall_package(store: &ReleaseStore, name: &str) -> Result<Release> {
    let release = store.get(name)?;
    tracing::info!("Uninstalling package {} (ColonyID: {})", release.name, release.colony_id);
    store.delete(name)?;
    Ok(release)
}

/// Installed releases in stored order.
pub fn list_releases(store: &ReleaseStore) -> Result<Vec<Release>> {
    store.list()
}
