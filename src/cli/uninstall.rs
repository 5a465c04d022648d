//! Forget an installed release.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;
use crate::package::uninstall_package;
use crate::state::StateLock;

/// Uninstall a package
#[derive(Args, Debug)]
pub struct UninstallCommand {
    /// Release name
    pub name: String,
}

impl UninstallCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let _lock = StateLock::acquire(&ctx.home).await?;
        let store = ctx.store()?;
        let release = uninstall_package(&store, &self.name)?;
        println!("{} Package {} uninstalled.", "✓".green(), release.name.bold());
        Ok(())
    }
}
