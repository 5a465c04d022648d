//! Core types shared across CPM: the error enum, its taxonomy and the
//! user-facing error renderer.

pub mod error;

pub use error::{CpmError, ErrorCategory, ErrorContext, user_friendly_error};
