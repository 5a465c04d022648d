//! Integration test suite for CPM
//!
//! End-to-end tests that drive the `cpm` binary. Every test gets its own
//! temporary working directory and `CPM_HOME`.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **workflow**: init, pack, publish, install, list, uninstall
//! - **install**: install sources, overrides and the HTTP submitter
//! - **errors**: exit status and messages for failing commands

mod common;
mod errors;
mod install;
mod workflow;
