//! Advisory file lock around state-changing commands.
//!
//! The lock lives at `CPM_HOME/.locks/state.lock` and is released when the
//! [`StateLock`] is dropped. The file itself persists: unlinking it while held
//! would let a waiter lock the orphaned inode while a newcomer locks a fresh
//! file at the same path.
//!
//! # Async Safety
//!
//! File operations run in `spawn_blocking` so lock polling never blocks the
//! tokio runtime.

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS, default_lock_timeout};
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

const LOCK_NAME: &str = "state";

/// Exclusive OS-level lock on the CPM home's release state.
///
/// # Example
///
/// ```rust,no_run
/// use cpm_cli::state::StateLock;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let _lock = StateLock::acquire(Path::new("/home/user/.cpm")).await?;
/// // install or uninstall...
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StateLock {
    /// The file handle - lock is released when this is dropped
    _file: Arc<File>,
    lock_path: PathBuf,
}

impl Drop for StateLock {
    fn drop(&mut self) {
        debug!(lock = LOCK_NAME, path = %self.lock_path.display(), "State lock released");
    }
}

impl StateLock {
    /// Acquire the lock with the default timeout.
    pub async fn acquire(home: &Path) -> Result<Self> {
        Self::acquire_with_timeout(home, default_lock_timeout()).await
    }

    /// Acquire the lock, polling with exponential backoff (10ms → 500ms).
    ///
    /// # Errors
    ///
    /// Returns a timeout error if the lock is still held after `timeout`.
    pub async fn acquire_with_timeout(home: &Path, timeout: Duration) -> Result<Self> {
        debug!(lock = LOCK_NAME, "Waiting for state lock");

        let locks_dir = home.join(".locks");
        tokio::fs::create_dir_all(&locks_dir)
            .await
            .with_context(|| format!("Failed to create locks directory: {}", locks_dir.display()))?;

        let lock_path = locks_dir.join(format!("{LOCK_NAME}.lock"));

        let lock_path_clone = lock_path.clone();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new().create(true).write(true).truncate(false).open(&lock_path_clone)
        })
        .await
        .with_context(|| "spawn_blocking panicked")?
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        let file = Arc::new(file);
        let start = std::time::Instant::now();

        let backoff = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS));

        for delay in backoff {
            let file_clone = Arc::clone(&file);
            let lock_result = tokio::task::spawn_blocking(move || file_clone.try_lock_exclusive())
                .await
                .with_context(|| "spawn_blocking panicked")?;

            match lock_result {
                Ok(true) => {
                    debug!(
                        lock = LOCK_NAME,
                        wait_ms = start.elapsed().as_millis(),
                        "State lock acquired"
                    );
                    return Ok(Self {
                        _file: file,
                        lock_path,
                    });
                }
                Ok(false) | Err(_) => {
                    let remaining = timeout.saturating_sub(start.elapsed());
                    if remaining.is_zero() {
                        return Err(anyhow::anyhow!(
                            "Timeout acquiring state lock in {} after {:?}",
                            home.display(),
                            timeout
                        ));
                    }
                    tokio::time::sleep(delay.min(remaining)).await;
                }
            }
        }

        Err(anyhow::anyhow!("Timeout acquiring state lock in {} after {:?}", home.display(), timeout))
    }
}
