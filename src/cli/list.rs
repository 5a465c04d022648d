//! List installed releases.
//!
//! ```bash
//! cpm list
//! cpm list --format json
//! ```

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::common::{CommandContext, format_table};
use crate::package::list_releases;
use crate::state::Release;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    #[default]
    Table,
    Json,
}

/// List installed packages
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = ListFormat::Table)]
    pub format: ListFormat,
}

impl ListCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let releases = list_releases(&ctx.store()?)?;
        match self.format {
            ListFormat::Json => {
                let json = serde_json::to_string_pretty(&releases).context("Failed to serialize releases")?;
                println!("{json}");
            }
            ListFormat::Table if releases.is_empty() => println!("No packages installed."),
            ListFormat::Table => print!("{}", render_table(&releases)),
        }
        Ok(())
    }
}

fn render_table(releases: &[Release]) -> String {
    let rows: Vec<Vec<String>> = releases
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.version.clone(),
                r.install_time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string(),
                r.colony_id.clone(),
            ]
        })
        .collect();
    format_table(&["NAME", "VERSION", "INSTALLED", "COLONY_ID"], &rows)
}
