use axum::{
    extract::{Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use bitcoin::{OutPoint, Psbt, Transaction, Txid};
use std::str::FromStr;
use std::sync::Arc;

use super::types::*;
use super::AppState;
use crate::assets;
use crate::bitcoin::{parse_for_network, FeeRate};
use crate::error::RecoveryError;
use crate::recovery::{PlannedInput, RecoveryTarget, TransactionBuilder};

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, RecoveryError> {
    let network = state.config.bitcoin_network;
    let fee_rate = FeeRate::from_sat_per_vb(req.fee_rate)?;
    parse_for_network(&req.address, network)?;

    let taproot_address = req.taproot_address.unwrap_or_else(|| req.address.clone());
    let payment_address = req
        .payment_address
        .unwrap_or_else(|| taproot_address.clone());
    let target = RecoveryTarget::resolve(&taproot_address, &payment_address, network)?;

    let categorised = assets::fetch_categorised(state.source.as_ref(), &req.address, network).await?;
    let analysis = state
        .analyzer
        .analyze(&categorised.inscriptions, fee_rate, &target);

    log::info!(
        "Analyzed {}: {} of {} inscription UTXOs recoverable, {} sats at {} sat fee (worthwhile: {})",
        req.address,
        analysis.recoverable.len(),
        categorised.inscriptions.len(),
        analysis.total_recoverable,
        analysis.total_fee,
        analysis.worthwhile
    );

    Ok(Json(AnalyzeResponse::new(analysis, fee_rate)))
}

pub async fn build_psbt_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BuildPsbtRequest>,
) -> Result<Json<BuildPsbtResponse>, RecoveryError> {
    let fee_rate = FeeRate::from_sat_per_vb(req.fee_rate)?;
    let target = RecoveryTarget::resolve(
        &req.taproot_address,
        &req.payment_address,
        state.config.bitcoin_network,
    )?;

    let inputs = req
        .inputs
        .iter()
        .map(|input| {
            let txid = Txid::from_str(&input.txid).map_err(|e| {
                RecoveryError::InvalidInput(format!("Invalid txid '{}': {}", input.txid, e))
            })?;
            Ok(PlannedInput {
                outpoint: OutPoint::new(txid, input.vout),
                value: input.value,
            })
        })
        .collect::<Result<Vec<_>, RecoveryError>>()?;

    let unsigned = TransactionBuilder::new(state.source.as_ref(), *state.analyzer.constants())
        .build(&inputs, &target, fee_rate)
        .await?;

    Ok(Json(BuildPsbtResponse::from(unsigned)))
}

pub async fn balances_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<BalancesResponse>, RecoveryError> {
    let network = state.config.bitcoin_network;
    parse_for_network(&address, network)?;

    let categorised = assets::fetch_categorised(state.source.as_ref(), &address, network).await?;
    Ok(Json(BalancesResponse::new(address, categorised)))
}

pub async fn broadcast_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, RecoveryError> {
    let tx = match (req.tx_hex, req.psbt) {
        (Some(tx_hex), None) => decode_tx_hex(&tx_hex)?,
        (None, Some(psbt)) => extract_finalized(&psbt)?,
        _ => {
            return Err(RecoveryError::InvalidInput(
                "exactly one of txHex or psbt is required".to_string(),
            ))
        }
    };

    let txid = state.broadcaster.broadcast(&tx).await?;
    log::info!("Broadcast transaction {}", txid);

    Ok(Json(BroadcastResponse {
        txid: txid.to_string(),
    }))
}

fn decode_tx_hex(tx_hex: &str) -> Result<Transaction, RecoveryError> {
    let bytes = hex::decode(tx_hex.trim())
        .map_err(|e| RecoveryError::InvalidInput(format!("Invalid transaction hex: {}", e)))?;
    bitcoin::consensus::deserialize(&bytes)
        .map_err(|e| RecoveryError::InvalidInput(format!("Invalid transaction: {}", e)))
}

fn extract_finalized(psbt_base64: &str) -> Result<Transaction, RecoveryError> {
    let bytes = B64
        .decode(psbt_base64.trim())
        .map_err(|e| RecoveryError::InvalidInput(format!("Invalid PSBT base64: {}", e)))?;
    let psbt = Psbt::deserialize(&bytes)
        .map_err(|e| RecoveryError::InvalidInput(format!("Invalid PSBT: {}", e)))?;

    let unfinalized = psbt
        .inputs
        .iter()
        .position(|input| input.final_script_witness.is_none() && input.final_script_sig.is_none());
    if let Some(index) = unfinalized {
        return Err(RecoveryError::InvalidInput(format!(
            "PSBT input {} is not finalized",
            index
        )));
    }

    psbt.extract_tx()
        .map_err(|e| RecoveryError::InvalidInput(format!("Cannot extract transaction: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tx_hex_rejects_garbage() {
        assert!(matches!(
            decode_tx_hex("not hex"),
            Err(RecoveryError::InvalidInput(_))
        ));
        assert!(matches!(
            decode_tx_hex("deadbeef"),
            Err(RecoveryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unfinalized_psbt_is_rejected() {
        let tx = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: bitcoin::absolute::LockTime::ZERO,
            input: vec![bitcoin::TxIn::default()],
            output: vec![],
        };
        let psbt = Psbt::from_unsigned_tx(tx).unwrap();
        let encoded = B64.encode(psbt.serialize());
        let err = extract_finalized(&encoded).unwrap_err();
        assert!(err.to_string().contains("not finalized"));
    }
}
