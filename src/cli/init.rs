//! Scaffold a new package directory.
//!
//! ```bash
//! cpm init demo              # creates ./demo
//! cpm init demo --path pkgs  # creates ./pkgs/demo
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::package::init_package;

/// Create a new CPM package
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Package name; also the new directory's name
    pub name: String,

    /// Parent directory to create the package in
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

impl InitCommand {
    pub fn execute(self) -> Result<()> {
        let dir = init_package(&self.path, &self.name)?;
        println!("{} Successfully initialized package '{}' in {}", "✓".green(), self.name, dir.display());
        Ok(())
    }
}
