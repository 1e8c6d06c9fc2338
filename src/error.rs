use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Why a batch cannot be built: one payment output would fall below the dust minimum.
///
/// Carries enough detail for the caller to raise the fee rate or drop an input without
/// re-deriving the arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    /// Position of the offending input in batch order.
    pub input_index: usize,
    pub input_value: u64,
    /// Fee the offending input was asked to absorb (the whole batch fee for the last input, else 0).
    pub fee_absorbed: u64,
    /// Total batch fee at the requested rate.
    pub batch_fee: u64,
    pub minimum_output: u64,
    /// Payment output the input would have produced; negative when the input cannot even cover
    /// the inscription output plus fee.
    pub payment_output: i64,
    /// Additional sats the input would need for its payment output to reach the minimum.
    pub shortfall: u64,
}

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),

    #[error("Input not found: {txid}:{vout}")]
    InputNotFound { txid: String, vout: u32 },

    #[error(
        "Insufficient value: input {} ({} sats) leaves a payment output of {} sats after a {} sat fee, below the {} sat minimum (short by {} sats)",
        .0.input_index, .0.input_value, .0.payment_output, .0.fee_absorbed, .0.minimum_output, .0.shortfall
    )]
    InsufficientValue(Shortfall),

    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecoveryError {
    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecoveryError::UpstreamUnavailable(_))
    }

    pub(crate) fn invalid_address(address: &str, reason: impl ToString) -> Self {
        RecoveryError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl IntoResponse for RecoveryError {
    fn into_response(self) -> Response {
        let status = match &self {
            RecoveryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RecoveryError::InvalidAddress { .. } => StatusCode::BAD_REQUEST,
            RecoveryError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RecoveryError::UpstreamProtocol(_) => StatusCode::BAD_GATEWAY,
            RecoveryError::InputNotFound { .. } => StatusCode::NOT_FOUND,
            RecoveryError::InsufficientValue(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RecoveryError::BroadcastRejected(_) => StatusCode::BAD_REQUEST,
            RecoveryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match &self {
            RecoveryError::InsufficientValue(shortfall) => json!(shortfall),
            RecoveryError::InputNotFound { txid, vout } => json!({ "txid": txid, "vout": vout }),
            RecoveryError::InvalidAddress { address, .. } => json!({ "address": address }),
            _ => serde_json::Value::Null,
        };

        let mut body = json!({ "error": self.to_string(), "retryable": self.is_retryable() });
        if !details.is_null() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_value_message_reports_amounts() {
        let err = RecoveryError::InsufficientValue(Shortfall {
            input_index: 0,
            input_value: 1000,
            fee_absorbed: 154,
            batch_fee: 154,
            minimum_output: 546,
            payment_output: 516,
            shortfall: 30,
        });
        let msg = err.to_string();
        assert!(msg.contains("516 sats"));
        assert!(msg.contains("154 sat fee"));
        assert!(msg.contains("short by 30 sats"));
    }

    #[test]
    fn test_only_upstream_unavailable_is_retryable() {
        assert!(RecoveryError::UpstreamUnavailable("timeout".into()).is_retryable());
        assert!(!RecoveryError::UpstreamProtocol("bad".into()).is_retryable());
        assert!(!RecoveryError::InvalidInput("bad".into()).is_retryable());
    }

    async fn response_body(err: RecoveryError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_response_body_flags_retryable_errors() {
        let (status, body) = response_body(RecoveryError::UpstreamUnavailable("timeout".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["retryable"], true);
        assert!(body.get("details").is_none());

        let (status, body) = response_body(RecoveryError::InputNotFound {
            txid: "ab".repeat(32),
            vout: 2,
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["retryable"], false);
        assert_eq!(body["details"]["vout"], 2);
    }
}
