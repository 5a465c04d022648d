//! CPM CLI entry point
//!
//! Parses arguments, runs the command and renders failures through the
//! user-friendly error reporter with exit status 1.

use anyhow::Result;
use clap::Parser;
use cpm_cli::cli;
use cpm_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
