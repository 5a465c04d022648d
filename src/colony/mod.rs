//! Delivery of rendered documents to ColonyOS.
//!
//! [`Submitter`] is the boundary the install pipeline submits through. Two
//! implementations exist:
//!
//! - [`LoopbackSubmitter`] logs each document and accepts it; useful offline
//!   and the default
//! - [`HttpSubmitter`] POSTs each document to a ColonyOS server, optionally
//!   signed with an Ed25519 key
//!
//! [`ColonyClient`] is the configuration-selected variant the CLI wires in.

pub mod http;

use anyhow::Result;
use std::future::Future;

use crate::config::{ColonySettings, SubmitterKind};

pub use http::{HttpSubmitter, parse_private_key};

/// Delivers documents to the execution platform.
pub trait Submitter {
    /// Submit one workflow document (JSON bytes).
    fn submit_workflow(&self, document: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Register one function document (JSON bytes).
    fn register_function(&self, document: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// Accepts every document without contacting a server.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackSubmitter;

impl Submitter for LoopbackSubmitter {
    async fn submit_workflow(&self, document: &[u8]) -> Result<()> {
        tracing::info!(bytes = document.len(), "Loopback submission accepted");
        Ok(())
    }

    async fn register_function(&self, document: &[u8]) -> Result<()> {
        tracing::info!(bytes = document.len(), "Loopback function registration accepted");
        Ok(())
    }
}

/// The submitter selected by configuration
#[derive(Debug, Clone)]
pub enum ColonyClient {
    Loopback(LoopbackSubmitter),
    Http(HttpSubmitter),
}

impl ColonyClient {
    /// Build the client for the configured submitter kind.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP submitter's private key is malformed or the HTTP
    /// client cannot be built.
    pub fn from_settings(settings: &ColonySettings) -> Result<Self> {
        match settings.submitter {
            SubmitterKind::Loopback => Ok(Self::Loopback(LoopbackSubmitter)),
            SubmitterKind::Http => Ok(Self::Http(HttpSubmitter::new(settings)?)),
        }
    }
}

impl Submitter for ColonyClient {
    async fn submit_workflow(&self, document: &[u8]) -> Result<()> {
        match self {
            Self::Loopback(s) => s.submit_workflow(document).await,
            Self::Http(s) => s.submit_workflow(document).await,
        }
    }

    async fn register_function(&self, document: &[u8]) -> Result<()> {
        match self {
            Self::Loopback(s) => s.register_function(document).await,
            Self::Http(s) => s.register_function(document).await,
        }
    }
}
