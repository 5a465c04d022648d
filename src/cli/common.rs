//! Shared state and helpers for CLI commands

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{CpmConfig, registry_dir};
use crate::registry::LocalRegistry;
use crate::state::ReleaseStore;

/// Everything a command needs from the global flags, resolved once.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The CPM home directory
    pub home: PathBuf,
    /// Whether spinners may be drawn
    pub show_progress: bool,
}

impl CommandContext {
    pub fn store(&self) -> Result<ReleaseStore> {
        ReleaseStore::new(&self.home).context("Failed to open release state")
    }

    pub fn registry(&self) -> Result<LocalRegistry> {
        LocalRegistry::new(registry_dir(&self.home)).context("Failed to open local registry")
    }

    pub async fn config(&self) -> Result<CpmConfig> {
        CpmConfig::load(&self.home).await
    }
}

/// Render rows as left-aligned columns separated by three spaces.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
    for row in std::iter::once(&header_cells).chain(rows) {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths.get(i).copied().unwrap_or(0)))
            .collect();
        out.push_str(line.join("   ").trim_end());
        out.push('\n');
    }
    out
}
