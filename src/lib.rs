//! CPM - Colony Package Manager
//!
//! Packages templated ColonyOS workflow definitions, publishes them to a
//! registry and installs them onto a colony, keeping a local record of what is
//! installed.
//!
//! # Architecture Overview
//!
//! A package is a directory with a `colony.yaml` manifest, default values in
//! `values.yaml` and Tera templates under `templates/`. Installing a package:
//!
//! 1. resolves it from a directory, a `.cpm` artifact or the registry
//! 2. merges default values with `--set` overrides
//! 3. renders every template into one JSON array of documents
//! 4. submits each document to ColonyOS
//! 5. records a release in `CPM_HOME/state.json`
//!
//! # Core Modules
//!
//! - [`manifest`] - `colony.yaml` model and validation
//! - [`archive`] - deterministic gzip tar artifacts with safe extraction
//! - [`values`] - values loading, merging and `--set` parsing
//! - [`templating`] - Tera rendering with the `Values` context and helper filters
//! - [`installer`] - the install pipeline
//! - [`state`] - release store and advisory state lock
//! - [`colony`] - loopback and HTTP submitters
//! - [`registry`] - directory-backed package registry
//! - [`package`] - init, pack, publish, uninstall and list operations
//! - [`config`] - CPM home resolution and `config.toml`
//! - [`cli`] - the `cpm` command line
//! - [`core`] - error types and user-facing error rendering
//!
//! # Example
//!
//! ```rust,no_run
//! use cpm_cli::colony::LoopbackSubmitter;
//! use cpm_cli::installer::{InstallOptions, Installer};
//! use cpm_cli::registry::LocalRegistry;
//! use cpm_cli::state::ReleaseStore;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let home = Path::new("/home/user/.cpm");
//! let registry = LocalRegistry::new(home.join("registry"))?;
//! let store = ReleaseStore::new(home)?;
//!
//! let outcome = Installer::new(LoopbackSubmitter, &registry, &store)
//!     .install(InstallOptions {
//!         source: "./demo".to_string(),
//!         ..InstallOptions::default()
//!     })
//!     .await?;
//! println!("installed {}", outcome.release.name);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cli;
pub mod colony;
pub mod config;
pub mod constants;
pub mod core;
pub mod installer;
pub mod manifest;
pub mod package;
pub mod registry;
pub mod state;
pub mod templating;
pub mod utils;
pub mod values;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
