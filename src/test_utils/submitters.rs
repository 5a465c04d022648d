//! In-memory submitter for pipeline tests

use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::colony::Submitter;

/// Records every submitted document; optionally rejects the document at a
/// given position.
///
/// Clones share the same record, so a test can keep one handle and give the
/// other to the installer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSubmitter {
    documents: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_at: Option<usize>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `index`-th workflow submission (zero-based).
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// Accepted documents parsed as JSON.
    pub fn documents(&self) -> Vec<serde_json::Value> {
        self.raw_documents()
            .iter()
            .map(|doc| serde_json::from_slice(doc).unwrap_or(serde_json::Value::Null))
            .collect()
    }

    /// Accepted documents as submitted.
    pub fn raw_documents(&self) -> Vec<Vec<u8>> {
        self.documents.lock().map(|docs| docs.clone()).unwrap_or_default()
    }
}

impl Submitter for RecordingSubmitter {
    async fn submit_workflow(&self, document: &[u8]) -> Result<()> {
        let mut documents = self.documents.lock().map_err(|_| anyhow::anyhow!("recorder poisoned"))?;
        if self.fail_at == Some(documents.len()) {
            anyhow::bail!("server returned error 500: rejected");
        }
        documents.push(document.to_vec());
        Ok(())
    }

    async fn register_function(&self, _document: &[u8]) -> Result<()> {
        Ok(())
    }
}
