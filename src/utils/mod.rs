//! Filesystem and terminal helpers
//!
//! # Modules
//!
//! - [`fs`] - Directory creation, atomic writes and file copies
//! - [`progress`] - Spinners for long-running CLI operations

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, copy_file, ensure_dir, safe_write};
pub use progress::ProgressBar;
