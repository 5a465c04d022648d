//! Command-line interface for CPM (Colony Package Manager).
//!
//! Each command lives in its own module with its own argument struct.
//!
//! # Available Commands
//!
//! ## Authoring
//! - `init` - Scaffold a new package directory
//! - `pack` - Build a `{name}-{version}.cpm` artifact
//! - `publish` - Pack and copy the artifact into the local registry
//!
//! ## Deployment
//! - `install` - Render a package and submit its documents to ColonyOS
//! - `uninstall` - Forget an installed release
//! - `list` - Show installed releases
//! - `search` - Find packages in the local registry
//!
//! # Global Options
//!
//! - `-v/--verbose` - debug logging
//! - `-q/--quiet` - errors only
//! - `--no-progress` - no spinners (also `CPM_NO_PROGRESS`)
//! - `--home <DIR>` - CPM home directory (also `CPM_HOME`, default `~/.cpm`)
//!
//! # Basic Workflow
//!
//! ```bash
//! cpm init demo
//! cpm pack demo
//! cpm publish demo
//! cpm install demo --version 0.1.0 --set environment=prod
//! cpm list
//! cpm uninstall demo
//! ```

mod common;
pub mod init;
pub mod install;
pub mod list;
pub mod pack;
pub mod publish;
pub mod search;
pub mod uninstall;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use common::CommandContext;

use crate::config::resolve_home;

/// Settings derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can build one directly.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
    /// Disable spinners
    pub no_progress: bool,
    /// Explicit CPM home (`--home`)
    pub home: Option<PathBuf>,
}

/// Colony Package Manager
#[derive(Parser, Debug)]
#[command(
    name = "cpm",
    about = "Colony Package Manager - package and deploy ColonyOS workloads",
    version,
    long_about = "CPM packages templated ColonyOS workflow definitions, publishes them to a registry and installs them onto a colony."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress spinners (also `CPM_NO_PROGRESS`)
    #[arg(long, global = true)]
    no_progress: bool,

    /// CPM home directory (defaults to $CPM_HOME, then ~/.cpm)
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new CPM package
    Init(init::InitCommand),
    /// Package a directory into a .cpm artifact
    Pack(pack::PackCommand),
    /// Publish a package to the registry
    Publish(publish::PublishCommand),
    /// Install a CPM package
    Install(install::InstallCommand),
    /// Uninstall a package
    Uninstall(uninstall::UninstallCommand),
    /// List installed packages
    List(list::ListCommand),
    /// Search for packages in the registry
    Search(search::SearchCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            no_progress: self.no_progress,
            home: self.home.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        init_logging(config.log_level.as_deref());

        let ctx = CommandContext {
            home: resolve_home(config.home)?,
            show_progress: !config.no_progress,
        };
        tracing::debug!(home = %ctx.home.display(), "Resolved CPM home");

        match self.command {
            Commands::Init(cmd) => cmd.execute(),
            Commands::Pack(cmd) => cmd.execute(),
            Commands::Publish(cmd) => cmd.execute(&ctx),
            Commands::Install(cmd) => cmd.execute(&ctx).await,
            Commands::Uninstall(cmd) => cmd.execute(&ctx).await,
            Commands::List(cmd) => cmd.execute(&ctx),
            Commands::Search(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `level`.
fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
