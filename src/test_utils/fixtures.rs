//! Package directory fixtures

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::{ColonyManifest, MANIFEST_FILE};
use crate::values::VALUES_FILE;

/// Builder for a package directory on disk.
#[derive(Clone, Debug)]
pub struct PackageFixture {
    pub name: String,
    pub version: String,
    values: Option<String>,
    templates: Vec<(String, String)>,
    files: Vec<(String, String)>,
    with_manifest: bool,
}

impl PackageFixture {
    /// A package with a manifest and nothing else.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            values: None,
            templates: Vec::new(),
            files: Vec::new(),
            with_manifest: true,
        }
    }

    /// Package `demo`: `environment: dev` and one template emitting
    /// `{"env": "<ENVIRONMENT>"}`.
    pub fn demo() -> Self {
        Self::new("demo")
            .values("environment: dev\n")
            .template("spec.json", r#"{"env": "{{ Values.environment | upper }}"}"#)
    }

    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Raw `values.yaml` content.
    #[must_use]
    pub fn values(mut self, yaml: &str) -> Self {
        self.values = Some(yaml.to_string());
        self
    }

    /// A file under `templates/`; `relative` may contain subdirectories.
    #[must_use]
    pub fn template(mut self, relative: &str, content: &str) -> Self {
        self.templates.push((relative.to_string(), content.to_string()));
        self
    }

    /// Any other file relative to the package root.
    #[must_use]
    pub fn file(mut self, relative: &str, content: &str) -> Self {
        self.files.push((relative.to_string(), content.to_string()));
        self
    }

    #[must_use]
    pub fn without_manifest(mut self) -> Self {
        self.with_manifest = false;
        self
    }

    /// Write the package to `parent/<name>` and return that directory.
    pub fn write_to(&self, parent: &Path) -> Result<PathBuf> {
        let dir = parent.join(&self.name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create fixture dir: {}", dir.display()))?;

        if self.with_manifest {
            let mut manifest = ColonyManifest::scaffold(&self.name);
            manifest.version = self.version.clone();
            manifest.save(&dir)?;
            debug_assert!(dir.join(MANIFEST_FILE).exists());
        }

        if let Some(values) = &self.values {
            fs::write(dir.join(VALUES_FILE), values)?;
        }

        for (relative, content) in &self.templates {
            write_file(&dir.join("templates").join(relative), content)?;
        }
        for (relative, content) in &self.files {
            write_file(&dir.join(relative), content)?;
        }

        Ok(dir)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write fixture file: {}", path.display()))
}
