//! Package registry: where published artifacts live and are fetched from.
//!
//! [`Registry`] is the boundary the install pipeline and `publish`/`search`
//! commands talk to. [`LocalRegistry`] is a directory-backed stand-in rooted
//! at `CPM_HOME/registry`: publish copies the artifact in, fetch copies an
//! exact `{name}-{version}.cpm` match out into a scoped download directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::core::CpmError;
use crate::manifest::{ARTIFACT_EXTENSION, artifact_file_name};
use crate::utils::fs::{copy_file, ensure_dir};

/// A fetched artifact in a scoped download directory.
///
/// The directory and its contents are removed when this value is dropped.
#[derive(Debug)]
pub struct FetchedArtifact {
    path: PathBuf,
    download_dir: TempDir,
}

impl FetchedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The download directory that owns the artifact.
    pub fn dir(&self) -> &Path {
        self.download_dir.path()
    }
}

/// Resolves package identities to fetchable artifacts.
pub trait Registry {
    /// Make `artifact` available under its file name.
    fn publish(&self, artifact: &Path) -> Result<()>;

    /// # Errors
    ///
    /// [`CpmError::ArtifactNotFound`] when no artifact matches `name` and `version`.
    fn fetch(&self, name: &str, version: &str) -> Result<FetchedArtifact>;

    /// Artifact file names containing `query`, sorted.
    fn search(&self, query: &str) -> Result<Vec<String>>;
}

/// Directory-backed registry
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    /// Open (and create if needed) a registry rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ensure_dir(&root)
            .with_context(|| format!("Failed to create registry directory: {}", root.display()))?;
        Ok(Self {
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Registry for LocalRegistry {
    fn publish(&self, artifact: &Path) -> Result<()> {
        let file_name = artifact
            .file_name()
            .ok_or_else(|| CpmError::validation(format!("{} has no file name", artifact.display())))?;
        let dest = self.root.join(file_name);
        copy_file(artifact, &dest)?;
        tracing::info!("Published {} to {}", file_name.to_string_lossy(), self.root.display());
        Ok(())
    }

    fn fetch(&self, name: &str, version: &str) -> Result<FetchedArtifact> {
        check_component("name", name)?;
        check_component("version", version)?;
        let file_name = artifact_file_name(name, version);
        let remote = self.root.join(&file_name);
        if !remote.is_file() {
            return Err(CpmError::ArtifactNotFound {
                name: name.to_string(),
                version: version.to_string(),
            }
            .into());
        }

        let dir = tempfile::Builder::new()
            .prefix("cpm-fetch-")
            .tempdir()
            .context("Failed to create download directory")?;
        let path = dir.path().join(&file_name);
        copy_file(&remote, &path)?;

        tracing::info!("Fetched {} from {}", file_name, self.root.display());
        Ok(FetchedArtifact {
            path,
            download_dir: dir,
        })
    }

    fn search(&self, query: &str) -> Result<Vec<String>> {
        let suffix = format!(".{}", ARTIFACT_EXTENSION);
        let mut results = Vec::new();
        for entry in std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read registry: {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(&suffix) && name.contains(query) {
                results.push(name);
            }
        }
        results.sort();
        Ok(results)
    }
}

/// Package names and versions become file names inside the registry root.
fn check_component(kind: &str, value: &str) -> Result<(), CpmError> {
    if value.is_empty() || value.contains(['/', '\\']) || value.contains("..") {
        return Err(CpmError::validation(format!("invalid package {kind} '{value}'")));
    }
    Ok(())
}
