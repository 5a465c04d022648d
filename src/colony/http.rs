//! HTTP submission to a ColonyOS server.
//!
//! Each document is POSTed to `http://{host}:{port}/api/workflows` with:
//!
//! - `Content-Type: application/json`
//! - `X-Colony-ID: {colony_id}`
//! - `X-Colony-Signature: {hex ed25519 signature of the body}` when a private
//!   key is configured
//!
//! A status of 400 or above is an error carrying the status and body.

use anyhow::{Context, Result};
use ed25519_dalek::{Signer, SigningKey};

use super::Submitter;
use crate::config::ColonySettings;
use crate::constants::SUBMIT_TIMEOUT;
use crate::core::CpmError;

pub const COLONY_ID_HEADER: &str = "X-Colony-ID";
pub const SIGNATURE_HEADER: &str = "X-Colony-Signature";

/// Submits documents over HTTP
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    url: String,
    colony_id: String,
    signing_key: Option<SigningKey>,
}

/// Parse a hex-encoded Ed25519 key: a 32-byte seed or a 64-byte keypair.
pub fn parse_private_key(hex_key: &str) -> Result<SigningKey, CpmError> {
    let bytes = hex::decode(hex_key.trim()).map_err(|e| CpmError::ConfigError {
        message: format!("invalid private key hex: {}", e),
    })?;

    match bytes.len() {
        32 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        64 => {
            let mut keypair = [0u8; 64];
            keypair.copy_from_slice(&bytes);
            SigningKey::from_keypair_bytes(&keypair).map_err(|e| CpmError::ConfigError {
                message: format!("invalid private key: {}", e),
            })
        }
        n => Err(CpmError::ConfigError {
            message: format!("invalid private key length: got {} bytes, want 32 or 64", n),
        }),
    }
}

impl HttpSubmitter {
    pub fn new(settings: &ColonySettings) -> Result<Self> {
        let signing_key = match settings.private_key.as_deref() {
            Some(key) if !key.is_empty() => Some(parse_private_key(key)?),
            _ => None,
        };

        let client = reqwest::Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: format!("http://{}:{}/api/workflows", settings.host, settings.port),
            colony_id: settings.colony_id.clone().unwrap_or_default(),
            signing_key,
        })
    }

    fn sign(&self, payload: &[u8]) -> Option<String> {
        self.signing_key.as_ref().map(|key| hex::encode(key.sign(payload).to_bytes()))
    }
}

impl Submitter for HttpSubmitter {
    async fn submit_workflow(&self, document: &[u8]) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(COLONY_ID_HEADER, &self.colony_id)
            .body(document.to_vec());

        if let Some(signature) = self.sign(document) {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to submit workflow to {}", self.url))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("server returned error {}: {}", status.as_u16(), body);
        }

        tracing::info!(url = %self.url, "Workflow submitted");
        Ok(())
    }

    async fn register_function(&self, document: &[u8]) -> Result<()> {
        tracing::info!(
            bytes = document.len(),
            url = %self.url,
            "Function registration is not supported by the server; skipping"
        );
        Ok(())
    }
}
