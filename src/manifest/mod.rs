//! Package manifest (`colony.yaml`) parsing and validation.
//!
//! A manifest carries a package's identity and metadata. Identity is the pair
//! `(name, version)`; it names the packed artifact (`{name}-{version}.cpm`)
//! and is what the registry resolves.
//!
//! # Structure
//!
//! ```yaml
//! apiVersion: v1
//! name: demo
//! version: 0.1.0
//! description: A ColonyOS package
//! maintainers:
//!   - name: Jane Doe
//!     email: jane@example.com
//! dependencies:
//!   - name: base
//!     version: 1.0.0
//! conditions:
//!   colonyOSVersion: ">=1.0"
//!   architecture: amd64
//! ```
//!
//! Every field is optional when parsing; missing fields default to empty.
//! Pack and publish additionally require a non-empty `name` and `version`
//! (see [`ColonyManifest::validate`]).
//!
//! `dependencies` are recorded but not resolved.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::CpmError;

/// File name of the manifest at a package root.
pub const MANIFEST_FILE: &str = "colony.yaml";

/// File extension of packed artifacts.
pub const ARTIFACT_EXTENSION: &str = "cpm";

/// Default manifest API version written by `cpm init`.
pub const API_VERSION: &str = "v1";

/// The package manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub maintainers: Vec<Maintainer>,
    pub dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Maintainer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A declared dependency on another package. Not resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

/// Platform requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditions {
    #[serde(rename = "colonyOSVersion", skip_serializing_if = "Option::is_none")]
    pub colony_os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
}

impl ColonyManifest {
    /// Manifest written by `cpm init <name>`.
    pub fn scaffold(name: &str) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            name: name.to_string(),
            version: "0.1.0".to_string(),
            description: "A ColonyOS package".to_string(),
            maintainers: vec![Maintainer {
                name: "Your Name".to_string(),
                ..Maintainer::default()
            }],
            dependencies: Vec::new(),
            conditions: None,
        }
    }

    /// Load `package_dir/colony.yaml`.
    ///
    /// # Errors
    ///
    /// - [`CpmError::ManifestNotFound`] when the file does not exist
    /// - [`CpmError::ManifestParseError`] when the YAML is invalid or has the
    ///   wrong shape
    pub fn load(package_dir: &Path) -> Result<Self> {
        let path = package_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(CpmError::ManifestNotFound {
                path: package_dir.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;

        Self::parse(&content, &path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let manifest: Option<Self> = serde_yaml::from_str(content).map_err(|e| {
            CpmError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(manifest.unwrap_or_default())
    }

    /// Write the manifest as YAML to `package_dir/colony.yaml`.
    pub fn save(&self, package_dir: &Path) -> Result<()> {
        let path = package_dir.join(MANIFEST_FILE);
        let yaml = serde_yaml::to_string(self).context("Failed to serialize manifest")?;
        crate::utils::fs::safe_write(&path, &yaml)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))
    }

    /// Require a non-empty name and version.
    pub fn validate(&self) -> Result<(), CpmError> {
        if self.name.trim().is_empty() {
            return Err(CpmError::validation(format!("{} is missing a package name", MANIFEST_FILE)));
        }
        if self.version.trim().is_empty() {
            return Err(CpmError::validation(format!(
                "{} is missing a version for package '{}'",
                MANIFEST_FILE, self.name
            )));
        }
        Ok(())
    }

    /// `{name}-{version}.cpm`
    pub fn artifact_name(&self) -> String {
        artifact_file_name(&self.name, &self.version)
    }
}

/// Conventional artifact file name for a package identity.
pub fn artifact_file_name(name: &str, version: &str) -> String {
    format!("{}-{}.{}", name, version, ARTIFACT_EXTENSION)
}
