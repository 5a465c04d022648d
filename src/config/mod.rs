//! Global configuration for CPM.
//!
//! CPM keeps its state under a single home directory, resolved in this order:
//!
//! 1. The `--home` command-line flag
//! 2. The `CPM_HOME` environment variable
//! 3. `~/.cpm`
//!
//! The home holds the release state (`state.json`), the local registry
//! (`registry/`) and an optional `config.toml`:
//!
//! ```toml
//! [colony]
//! host = "colonies.example.com"
//! port = 50080
//! colony_id = "my-colony"
//! # hex Ed25519 key, 32-byte seed or 64-byte keypair (never commit this file!)
//! private_key = "..."
//! submitter = "http"
//! ```
//!
//! Every key is optional. Command-line flags override file values through
//! [`ColonyOverrides`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{
    CONFIG_FILE, CPM_HOME_ENV, DEFAULT_COLONY_HOST, DEFAULT_COLONY_PORT, DEFAULT_HOME_DIR_NAME,
    REGISTRY_DIR,
};

/// Which submitter install uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubmitterKind {
    /// Log and accept every document
    #[default]
    Loopback,
    /// POST documents to a ColonyOS server
    Http,
}

/// Connection settings for the ColonyOS server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonySettings {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colony_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub submitter: SubmitterKind,
}

impl Default for ColonySettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_COLONY_HOST.to_string(),
            port: DEFAULT_COLONY_PORT,
            colony_id: None,
            private_key: None,
            submitter: SubmitterKind::default(),
        }
    }
}

/// Command-line values that take precedence over `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct ColonyOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub colony_id: Option<String>,
    pub private_key: Option<String>,
    pub submitter: Option<SubmitterKind>,
}

impl ColonySettings {
    /// Apply command-line overrides on top of these settings.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ColonyOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if overrides.colony_id.is_some() {
            self.colony_id = overrides.colony_id;
        }
        if overrides.private_key.is_some() {
            self.private_key = overrides.private_key;
        }
        if let Some(submitter) = overrides.submitter {
            self.submitter = submitter;
        }
        self
    }
}

/// Contents of `CPM_HOME/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpmConfig {
    pub colony: ColonySettings,
}

impl CpmConfig {
    /// Path of the configuration file inside `home`.
    pub fn path(home: &Path) -> PathBuf {
        home.join(CONFIG_FILE)
    }

    /// Load `home/config.toml`, or the defaults when it does not exist.
    pub async fn load(home: &Path) -> Result<Self> {
        let path = Self::path(home);
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }
}

/// Resolve the CPM home directory.
///
/// `explicit` (the `--home` flag) wins, then a non-empty `CPM_HOME`, then
/// `~/.cpm`.
///
/// # Errors
///
/// Fails only when falling back to `~/.cpm` and the user's home directory
/// cannot be determined.
pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf> {
    resolve_home_with(explicit, std::env::var_os(CPM_HOME_ENV).map(PathBuf::from))
}

fn resolve_home_with(explicit: Option<PathBuf>, from_env: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(home);
    }
    if let Some(home) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(home);
    }
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
        .join(DEFAULT_HOME_DIR_NAME))
}

/// The local registry directory inside `home`.
pub fn registry_dir(home: &Path) -> PathBuf {
    home.join(REGISTRY_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = CpmConfig::load(temp.path()).await.unwrap();
        assert_eq!(config, CpmConfig::default());
        assert_eq!(config.colony.host, "localhost");
        assert_eq!(config.colony.port, 50080);
        assert_eq!(config.colony.submitter, SubmitterKind::Loopback);
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[colony]\ncolony_id = \"c1\"\nsubmitter = \"http\"\n",
        )
        .unwrap();

        let config = CpmConfig::load(temp.path()).await.unwrap();
        assert_eq!(config.colony.colony_id.as_deref(), Some("c1"));
        assert_eq!(config.colony.submitter, SubmitterKind::Http);
        assert_eq!(config.colony.host, "localhost");
    }

    #[tokio::test]
    async fn test_invalid_file_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[colony\n").unwrap();
        let err = CpmConfig::load(temp.path()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let settings = ColonySettings {
            colony_id: Some("from-file".to_string()),
            ..ColonySettings::default()
        }
        .with_overrides(ColonyOverrides {
            port: Some(8080),
            submitter: Some(SubmitterKind::Http),
            ..ColonyOverrides::default()
        });

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.colony_id.as_deref(), Some("from-file"));
        assert_eq!(settings.submitter, SubmitterKind::Http);
    }

    #[test]
    fn test_home_resolution_order() {
        let flag = PathBuf::from("/flag");
        let env = PathBuf::from("/env");

        assert_eq!(resolve_home_with(Some(flag.clone()), Some(env.clone())).unwrap(), flag);
        assert_eq!(resolve_home_with(None, Some(env.clone())).unwrap(), env);
        assert_eq!(resolve_home_with(Some(PathBuf::new()), Some(env.clone())).unwrap(), env);

        let fallback = resolve_home_with(None, Some(PathBuf::new())).unwrap();
        assert!(fallback.ends_with(".cpm"));
    }

    #[test]
    #[serial]
    fn test_resolve_home_reads_environment() {
        let temp = TempDir::new().unwrap();
        let previous = std::env::var_os(CPM_HOME_ENV);
        // SAFETY: serialized with other environment-touching tests
        unsafe { std::env::set_var(CPM_HOME_ENV, temp.path()) };

        let resolved = resolve_home(None);

        // SAFETY: as above
        unsafe {
            match previous {
                Some(value) => std::env::set_var(CPM_HOME_ENV, value),
                None => std::env::remove_var(CPM_HOME_ENV),
            }
        }
        assert_eq!(resolved.unwrap(), temp.path());
    }
}
