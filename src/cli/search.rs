//! Search the local registry by substring.

use anyhow::Result;
use clap::Args;

use super::common::{CommandContext, format_table};
use crate::registry::Registry;

/// Search for packages in the registry
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Substring to match against artifact file names
    pub query: String,
}

impl SearchCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let results = ctx.registry()?.search(&self.query)?;
        if results.is_empty() {
            println!("No packages found.");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = results
            .into_iter()
            .map(|file| {
                let display = file.strip_suffix(".cpm").unwrap_or(&file).to_string();
                vec![display, file]
            })
            .collect();
        print!("{}", format_table(&["NAME", "MATCH"], &rows));
        Ok(())
    }
}
