//! Spinners for long-running CLI operations
//!
//! Wraps `indicatif` with CPM styling. Progress output is suppressed when the
//! `CPM_NO_PROGRESS` environment variable is set or the caller asks for it
//! (the `--no-progress` flag), so scripted runs and tests see clean output.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Environment variable that disables all progress output.
pub const NO_PROGRESS_ENV: &str = "CPM_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// A spinner with consistent styling.
///
/// When progress is disabled this wraps a hidden bar that ignores every call.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a spinner for indeterminate progress operations.
    ///
    /// `show = false` yields a hidden spinner.
    pub fn new_spinner(show: bool) -> Self {
        let bar = if !show || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            inner: bar,
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Spinner with a message already set.
pub fn spinner_with_message(msg: impl Into<String>, show: bool) -> ProgressBar {
    let spinner = ProgressBar::new_spinner(show);
    spinner.set_message(msg);
    spinner
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}
