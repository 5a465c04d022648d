//! Test utilities for CPM
//!
//! Helpers shared by unit tests and the integration suite:
//! - [`init_test_logging`] wires `tracing` output into the test harness
//! - [`PackageFixture`] writes package directories to disk
//! - [`RecordingSubmitter`] captures submitted documents and can fail on demand
//!
//! # Example
//!
//! ```rust,no_run
//! use cpm_cli::test_utils::PackageFixture;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let package_dir = PackageFixture::demo().write_to(temp.path()).unwrap();
//! assert!(package_dir.join("colony.yaml").exists());
//! ```

pub mod fixtures;
pub mod submitters;

pub use fixtures::PackageFixture;
pub use submitters::RecordingSubmitter;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with
/// neither set, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
