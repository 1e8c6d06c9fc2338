use async_trait::async_trait;
use bitcoin::Txid;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{AddressParams, EsploraTransaction, RawBalances, RpcErrorObject, RpcRequest};
use super::UtxoSource;
use crate::config::RecoveryConfig;
use crate::error::RecoveryError;

const LOGGED_PAYLOAD_LIMIT: usize = 512;

/// JSON-RPC client for the indexing service.
///
/// No caching: every call is a fresh snapshot.
pub struct RpcClient {
    client: reqwest::Client,
    endpoint: String,
    balances_method: String,
    transaction_method: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(config: &RecoveryConfig) -> Result<Self, RecoveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RecoveryError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.rpc_endpoint(),
            balances_method: config.balances_method.clone(),
            transaction_method: config.transaction_method.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one JSON-RPC call and return its `result` member, which may be `null`.
    async fn call<P: Serialize>(&self, method: &str, params: P) -> Result<Value, RecoveryError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        log::debug!("RPC {} (id {})", method, request.id);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| unavailable(method, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| unavailable(method, e))?;

        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RecoveryError::UpstreamUnavailable(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let mut envelope: Value = serde_json::from_str(&body).map_err(|e| {
            protocol_error(method, &format!("response is not JSON ({})", e), &body)
        })?;

        if !status.is_success() && envelope.get("error").is_none() {
            return Err(protocol_error(method, &format!("HTTP {}", status), &body));
        }

        if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
            let reason = match serde_json::from_value::<RpcErrorObject>(error.clone()) {
                Ok(obj) => format!("error {}: {}", obj.code, obj.message),
                Err(_) => "malformed error object".to_string(),
            };
            return Err(protocol_error(method, &reason, &body));
        }

        match envelope.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(protocol_error(method, "missing result field", &body)),
        }
    }

    fn decode<T: DeserializeOwned>(method: &str, result: Value) -> Result<T, RecoveryError> {
        let raw = result.to_string();
        serde_json::from_value(result)
            .map_err(|e| protocol_error(method, &format!("unexpected result shape ({})", e), &raw))
    }
}

#[async_trait]
impl UtxoSource for RpcClient {
    async fn fetch_balances(&self, address: &str) -> Result<RawBalances, RecoveryError> {
        let method = self.balances_method.as_str();
        let result = self.call(method, [AddressParams { address }]).await?;

        if result.is_null() {
            return Err(protocol_error(method, "result is null", "null"));
        }

        let balances: RawBalances = Self::decode(method, result)?;
        log::debug!(
            "Fetched balances for {}: {} spendable, {} asset, {} pending",
            address,
            balances.spendable.len(),
            balances.assets.len(),
            balances.pending.len()
        );
        Ok(balances)
    }

    async fn fetch_transaction(
        &self,
        txid: &Txid,
    ) -> Result<Option<EsploraTransaction>, RecoveryError> {
        let method = self.transaction_method.as_str();
        let result = self.call(method, [txid.to_string()]).await?;

        if result.is_null() {
            return Ok(None);
        }

        Self::decode(method, result).map(Some)
    }
}

fn unavailable(method: &str, err: reqwest::Error) -> RecoveryError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    log::warn!("RPC {} {}: {}", method, kind, err);
    RecoveryError::UpstreamUnavailable(format!("{} {}: {}", method, kind, err))
}

fn protocol_error(method: &str, reason: &str, payload: &str) -> RecoveryError {
    log::error!(
        "RPC {} protocol error: {} (payload: {})",
        method,
        reason,
        truncate(payload, LOGGED_PAYLOAD_LIMIT)
    );
    RecoveryError::UpstreamProtocol(format!("{}: {}", method, reason))
}

fn truncate(payload: &str, limit: usize) -> String {
    if payload.len() <= limit {
        return payload.to_string();
    }
    let mut end = limit;
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &payload[..end], payload.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_limit_and_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let long = "é".repeat(10); // 20 bytes
        let cut = truncate(&long, 5);
        assert!(cut.starts_with("éé"));
        assert!(cut.ends_with("(20 bytes)"));
    }

    #[test]
    fn test_rpc_request_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "sandshrew_balances",
            params: [AddressParams { address: "bc1p..." }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "sandshrew_balances",
                "params": [{ "address": "bc1p..." }]
            })
        );
    }
}
