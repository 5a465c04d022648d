//! Pack a package directory into a `.cpm` artifact.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::package::pack_package;

/// Package a directory into a .cpm artifact
#[derive(Args, Debug)]
pub struct PackCommand {
    /// Package directory containing colony.yaml
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Directory to write the artifact to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

impl PackCommand {
    pub fn execute(self) -> Result<()> {
        let artifact = pack_package(&self.dir, &self.output)?;
        println!("{} Package created: {}", "✓".green(), artifact.display());
        Ok(())
    }
}
