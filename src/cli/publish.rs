//! Publish a package to the local registry.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::CommandContext;
use crate::package::publish_package;

/// Publish a package to the registry
#[derive(Args, Debug)]
pub struct PublishCommand {
    /// Package directory containing colony.yaml
    pub path: PathBuf,
}

impl PublishCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let registry = ctx.registry()?;
        let manifest = publish_package(&self.path, &registry)?;
        println!(
            "{} Package {} version {} published successfully.",
            "✓".green(),
            manifest.name.bold(),
            manifest.version
        );
        Ok(())
    }
}
