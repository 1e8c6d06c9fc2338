use base64::{engine::general_purpose::STANDARD as B64, Engine};
use bitcoin::blockdata::script::ScriptBuf;
use bitcoin::blockdata::transaction::{Transaction, TxIn, TxOut};
use bitcoin::blockdata::witness::Witness;
use bitcoin::transaction::{OutPoint, Sequence};
use bitcoin::{absolute, Amount, Psbt};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;

use super::allocation::{allocate, SizedInput};
use super::analyzer::RecoverableInscription;
use super::{RecoveryConstants, RecoveryTarget};
use crate::bitcoin::FeeRate;
use crate::error::RecoveryError;
use crate::types::serialize_outpoint;
use crate::upstream::UtxoSource;

/// An input the caller wants spent, with the value it believes the output holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedInput {
    #[serde(serialize_with = "serialize_outpoint")]
    pub outpoint: OutPoint,
    pub value: Option<u64>,
}

impl From<&RecoverableInscription> for PlannedInput {
    fn from(line: &RecoverableInscription) -> Self {
        Self {
            outpoint: line.outpoint,
            value: Some(line.value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputRole {
    Inscription,
    Payment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDetail {
    pub index: usize,
    pub role: OutputRole,
    pub address: String,
    pub value: u64,
}

/// Parent output as read from the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LiveInput {
    outpoint: OutPoint,
    value: u64,
    script_pubkey: ScriptBuf,
    vbytes: u64,
}

/// Unsigned recovery transaction ready for an external signer.
#[derive(Debug, Clone)]
pub struct UnsignedRecovery {
    pub psbt: Psbt,
    /// Inputs in transaction order, carrying live values
    pub inputs: Vec<PlannedInput>,
    pub outputs: Vec<OutputDetail>,
    pub fee: u64,
    pub vsize: u64,
    pub fee_rate: FeeRate,
}

impl UnsignedRecovery {
    pub fn to_base64(&self) -> String {
        B64.encode(self.psbt.serialize())
    }

    pub fn total_input(&self) -> u64 {
        self.inputs.iter().filter_map(|i| i.value).sum()
    }

    pub fn total_output(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }
}

/// Builds the consolidating transaction from live parent outputs.
pub struct TransactionBuilder<'a, S: UtxoSource + ?Sized> {
    source: &'a S,
    constants: RecoveryConstants,
}

impl<'a, S: UtxoSource + ?Sized> TransactionBuilder<'a, S> {
    pub fn new(source: &'a S, constants: RecoveryConstants) -> Self {
        Self { source, constants }
    }

    /// Build the unsigned transaction for `inputs`, in the given order.
    ///
    /// Input `i` maps to outputs `2i` (inscription, to the taproot address) and `2i + 1`
    /// (payment). The last payment output pays the whole fee.
    pub async fn build(
        &self,
        inputs: &[PlannedInput],
        target: &RecoveryTarget,
        fee_rate: FeeRate,
    ) -> Result<UnsignedRecovery, RecoveryError> {
        if inputs.is_empty() {
            return Err(RecoveryError::InvalidInput(
                "at least one input is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(inputs.len());
        for input in inputs {
            if !seen.insert(input.outpoint) {
                return Err(RecoveryError::InvalidInput(format!(
                    "duplicate input {}",
                    input.outpoint
                )));
            }
        }

        let live = try_join_all(inputs.iter().map(|input| self.fetch_live(input))).await?;

        let sized: Vec<SizedInput> = live
            .iter()
            .map(|l| SizedInput {
                value: l.value,
                vbytes: l.vbytes,
            })
            .collect();
        let allocation = allocate(&sized, fee_rate, target.payment_kind(), &self.constants)
            .map_err(RecoveryError::InsufficientValue)?;

        let inscription_script = target.taproot.script_pubkey();
        let payment_script = target.payment.script_pubkey();
        let inscription_address = target.taproot.to_string();
        let payment_address = target.payment.to_string();

        let mut tx = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: Vec::with_capacity(live.len()),
            output: Vec::with_capacity(allocation.output_count()),
        };
        let mut outputs = Vec::with_capacity(allocation.output_count());

        for (input, line) in live.iter().zip(&allocation.lines) {
            tx.input.push(TxIn {
                previous_output: input.outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            });

            outputs.push(OutputDetail {
                index: tx.output.len(),
                role: OutputRole::Inscription,
                address: inscription_address.clone(),
                value: line.inscription_output,
            });
            tx.output.push(TxOut {
                value: Amount::from_sat(line.inscription_output),
                script_pubkey: inscription_script.clone(),
            });

            outputs.push(OutputDetail {
                index: tx.output.len(),
                role: OutputRole::Payment,
                address: payment_address.clone(),
                value: line.payment_output,
            });
            tx.output.push(TxOut {
                value: Amount::from_sat(line.payment_output),
                script_pubkey: payment_script.clone(),
            });
        }

        let total_in = checked_total(live.iter().map(|l| l.value))?;
        let total_out = checked_total(tx.output.iter().map(|o| o.value.to_sat()))?;
        if total_out.checked_add(allocation.fee) != Some(total_in) {
            log::error!(
                "Recovery transaction does not balance: inputs {} outputs {} fee {}",
                total_in,
                total_out,
                allocation.fee
            );
            return Err(RecoveryError::Internal(format!(
                "outputs ({}) plus fee ({}) do not equal inputs ({})",
                total_out, allocation.fee, total_in
            )));
        }

        let mut psbt = Psbt::from_unsigned_tx(tx)
            .map_err(|e| RecoveryError::Internal(format!("Failed to create PSBT: {}", e)))?;
        for (psbt_input, input) in psbt.inputs.iter_mut().zip(&live) {
            psbt_input.witness_utxo = Some(TxOut {
                value: Amount::from_sat(input.value),
                script_pubkey: input.script_pubkey.clone(),
            });
        }

        log::info!(
            "Built recovery PSBT: {} inputs, {} outputs, {} sats in, fee {} sats ({} vB)",
            live.len(),
            outputs.len(),
            total_in,
            allocation.fee,
            allocation.vsize
        );

        Ok(UnsignedRecovery {
            psbt,
            inputs: live
                .iter()
                .map(|l| PlannedInput {
                    outpoint: l.outpoint,
                    value: Some(l.value),
                })
                .collect(),
            outputs,
            fee: allocation.fee,
            vsize: allocation.vsize,
            fee_rate,
        })
    }

    async fn fetch_live(&self, input: &PlannedInput) -> Result<LiveInput, RecoveryError> {
        let outpoint = input.outpoint;
        let not_found = || RecoveryError::InputNotFound {
            txid: outpoint.txid.to_string(),
            vout: outpoint.vout,
        };

        let parent = self
            .source
            .fetch_transaction(&outpoint.txid)
            .await?
            .ok_or_else(not_found)?;
        let output = parent
            .vout
            .get(outpoint.vout as usize)
            .ok_or_else(not_found)?;

        let script_pubkey = ScriptBuf::from_hex(&output.scriptpubkey).map_err(|e| {
            RecoveryError::UpstreamProtocol(format!(
                "parent output {} has malformed script: {}",
                outpoint, e
            ))
        })?;
        let vbytes = self.constants.input_vbytes(&script_pubkey).ok_or_else(|| {
            RecoveryError::InvalidInput(format!(
                "input {} has an unsupported script type, spend size unknown",
                outpoint
            ))
        })?;
        if output.value > Amount::MAX_MONEY.to_sat() {
            return Err(RecoveryError::UpstreamProtocol(format!(
                "parent output {} claims {} sats, above the money supply",
                outpoint, output.value
            )));
        }

        match input.value {
            Some(claimed) if claimed != output.value => {
                log::warn!(
                    "Input {} claimed {} sats but the chain holds {} sats; using live value",
                    outpoint,
                    claimed,
                    output.value
                );
            }
            _ => log::debug!("Input {} holds {} sats", outpoint, output.value),
        }

        Ok(LiveInput {
            outpoint,
            value: output.value,
            script_pubkey,
            vbytes,
        })
    }
}

fn checked_total(values: impl IntoIterator<Item = u64>) -> Result<u64, RecoveryError> {
    values
        .into_iter()
        .try_fold(0u64, |acc, v| acc.checked_add(v))
        .ok_or_else(|| RecoveryError::Internal("value total overflows u64".to_string()))
}
