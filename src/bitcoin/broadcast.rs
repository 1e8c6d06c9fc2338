use async_trait::async_trait;
use bitcoin::{Transaction, Txid};
use std::str::FromStr;
use std::time::Duration;

use crate::error::RecoveryError;

/// Relays a fully signed transaction to the network.
///
/// Retry policy belongs to the caller.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, RecoveryError>;
}

/// Broadcasts through an Esplora-compatible `POST /tx` endpoint.
pub struct EsploraBroadcaster {
    client: reqwest::Client,
    base_url: String,
}

impl EsploraBroadcaster {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RecoveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecoveryError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Broadcaster for EsploraBroadcaster {
    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, RecoveryError> {
        let tx_hex = bitcoin::consensus::encode::serialize_hex(tx);

        log::debug!("Broadcasting transaction to: {}/tx", self.base_url);

        let response = self
            .client
            .post(format!("{}/tx", self.base_url))
            .body(tx_hex)
            .send()
            .await
            .map_err(|e| RecoveryError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(if status.is_server_error() {
                RecoveryError::UpstreamUnavailable(format!("Broadcast failed ({}): {}", status, error_text))
            } else {
                RecoveryError::BroadcastRejected(error_text)
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RecoveryError::UpstreamUnavailable(e.to_string()))?;

        Txid::from_str(body.trim()).map_err(|e| {
            RecoveryError::UpstreamProtocol(format!("Broadcast returned invalid txid '{}': {}", body.trim(), e))
        })
    }
}
