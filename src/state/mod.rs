//! Release state: the durable record of installed packages.
//!
//! Releases live in `CPM_HOME/state.json`, a pretty-printed JSON array:
//!
//! ```json
//! [
//!   {
//!     "name": "demo",
//!     "version": "0.1.0",
//!     "colonyId": "my-colony",
//!     "installTime": "2026-01-01T12:00:00Z"
//!   }
//! ]
//! ```
//!
//! Names are unique: [`ReleaseStore::save`] replaces a release with the same
//! name in place and appends otherwise. No history is kept.
//!
//! Every operation reads the whole file, modifies it and (for writers) writes
//! it back through an atomic temp-file-and-rename. An in-process [`RwLock`]
//! lets readers run concurrently and serializes writers. Cross-process
//! coordination is the job of [`StateLock`], held by the CLI around install
//! and uninstall.

pub mod lock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::constants::STATE_FILE;
use crate::core::CpmError;
use crate::utils::fs::{atomic_write, ensure_dir};

pub use lock::StateLock;

/// An installed package instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub version: String,
    #[serde(rename = "colonyId")]
    pub colony_id: String,
    #[serde(rename = "installTime")]
    pub install_time: DateTime<Utc>,
}

impl Release {
    /// A release installed now.
    pub fn new(name: impl Into<String>, version: impl Into<String>, colony_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            colony_id: colony_id.into(),
            install_time: Utc::now(),
        }
    }
}

/// JSON-file-backed release store
#[derive(Debug)]
pub struct ReleaseStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl ReleaseStore {
    /// Open the store in `home`, creating the directory if needed.
    pub fn new(home: &Path) -> Result<Self> {
        ensure_dir(home)
            .with_context(|| format!("Failed to create CPM home directory: {}", home.display()))?;
        Ok(Self {
            path: home.join(STATE_FILE),
            lock: RwLock::new(()),
        })
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn load(&self) -> Result<Vec<Release>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let releases: Option<Vec<Release>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))?;
        Ok(releases.unwrap_or_default())
    }

    fn store(&self, releases: &[Release]) -> Result<()> {
        let json = serde_json::to_string_pretty(releases).context("Failed to serialize releases")?;
        atomic_write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))
    }

    /// Insert or replace the release with the same name.
    pub fn save(&self, release: Release) -> Result<()> {
        let _guard = self.write_guard();
        let mut releases = self.load()?;

        match releases.iter_mut().find(|r| r.name == release.name) {
            Some(existing) => *existing = release,
            None => releases.push(release),
        }

        self.store(&releases)
    }

    /// All releases in stored order.
    pub fn list(&self) -> Result<Vec<Release>> {
        let _guard = self.read_guard();
        self.load()
    }

    /// # Errors
    ///
    /// [`CpmError::ReleaseNotFound`] when no release has that name.
    pub fn get(&self, name: &str) -> Result<Release> {
        let _guard = self.read_guard();
        self.load()?.into_iter().find(|r| r.name == name).ok_or_else(|| {
            anyhow::Error::from(CpmError::ReleaseNotFound {
                name: name.to_string(),
            })
        })
    }

    /// Remove the named release. Removing an absent name is not an error.
    pub fn delete(&self, name: &str) -> Result<()> {
        let _guard = self.write_guard();
        let mut releases = self.load()?;
        releases.retain(|r| r.name != name);
        self.store(&releases)
    }
}
