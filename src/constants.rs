//! Global constants used throughout the CPM codebase.
//!
//! Timeouts, retry parameters and well-known names used across modules.

use std::time::Duration;

/// Default timeout for state lock acquisition (30 seconds).
pub fn default_lock_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Maximum backoff delay for exponential backoff (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
///
/// Doubles on each retry attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Timeout for a single HTTP submission (10 seconds).
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable naming the CPM home directory.
pub const CPM_HOME_ENV: &str = "CPM_HOME";

/// Directory under the user's home used when `CPM_HOME` is unset.
pub const DEFAULT_HOME_DIR_NAME: &str = ".cpm";

/// Release state file inside CPM home.
pub const STATE_FILE: &str = "state.json";

/// Local registry directory inside CPM home.
pub const REGISTRY_DIR: &str = "registry";

/// Global configuration file inside CPM home.
pub const CONFIG_FILE: &str = "config.toml";

/// Version recorded for every release until installs read the manifest.
pub const PLACEHOLDER_RELEASE_VERSION: &str = "0.1.0";

/// Release name used when neither an override nor a spec names one.
pub const UNKNOWN_RELEASE_NAME: &str = "unknown";

/// Default ColonyOS server host.
pub const DEFAULT_COLONY_HOST: &str = "localhost";

/// Default ColonyOS server port.
pub const DEFAULT_COLONY_PORT: u16 = 50080;
