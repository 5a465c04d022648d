//! Install a package: render its templates and submit them to ColonyOS.
//!
//! The package may be a directory, a `.cpm` artifact, or the name of a
//! package in the local registry (with `--version`).
//!
//! ```bash
//! cpm install ./demo --set environment=prod
//! cpm install demo-0.1.0.cpm
//! cpm install demo --version 0.1.0 --submitter http --colonyid my-colony --prvkey <hex>
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use super::common::CommandContext;
use crate::colony::ColonyClient;
use crate::config::{ColonyOverrides, SubmitterKind};
use crate::installer::{InstallOptions, Installer};
use crate::state::StateLock;
use crate::utils::progress::spinner_with_message;
use crate::values::parse_set_overrides;

/// Install a CPM package
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Package directory, .cpm artifact, or registry package name
    pub source: String,

    /// Override a top-level value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Package version (required when installing from the registry)
    #[arg(long)]
    pub version: Option<String>,

    /// ColonyOS server host
    #[arg(long)]
    pub host: Option<String>,

    /// ColonyOS server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Colony ID; also exposed to templates as `Values.colonyId`
    #[arg(long = "colonyid")]
    pub colony_id: Option<String>,

    /// Hex-encoded Ed25519 private key used to sign submissions
    #[arg(long = "prvkey")]
    pub private_key: Option<String>,

    /// Which submitter to use
    #[arg(long, value_enum)]
    pub submitter: Option<SubmitterKind>,
}

impl InstallCommand {
    fn install_options(&self) -> Result<InstallOptions> {
        let mut overrides = parse_set_overrides(&self.set)?;
        if let Some(colony_id) = self.colony_id.as_ref().filter(|id| !id.is_empty()) {
            overrides.insert("colonyId".to_string(), Value::String(colony_id.clone()));
        }
        Ok(InstallOptions {
            source: self.source.clone(),
            version: self.version.clone(),
            overrides,
        })
    }

    fn colony_overrides(&self) -> ColonyOverrides {
        ColonyOverrides {
            host: self.host.clone(),
            port: self.port,
            colony_id: self.colony_id.clone(),
            private_key: self.private_key.clone(),
            submitter: self.submitter,
        }
    }

    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let options = self.install_options()?;
        let settings = ctx.config().await?.colony.with_overrides(self.colony_overrides());
        let client = ColonyClient::from_settings(&settings)?;

        let _lock = StateLock::acquire(&ctx.home).await?;
        let registry = ctx.registry()?;
        let store = ctx.store()?;

        let spinner = spinner_with_message(format!("Installing {}...", self.source), ctx.show_progress);
        let result = Installer::new(client, &registry, &store).install(options).await;
        spinner.finish_and_clear();
        let outcome = result?;

        if let Some(warning) = &outcome.state_warning {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        }
        println!(
            "{} Installation complete. Submitted {} document(s) as release {}.",
            "✓".green(),
            outcome.submitted,
            outcome.release.name.bold()
        );
        Ok(())
    }
}
