use bitcoin::OutPoint;
use serde::Serialize;

use super::allocation::{allocate, estimate_vsize, SizedInput};
use super::{RecoveryConstants, RecoveryTarget};
use crate::bitcoin::FeeRate;
use crate::error::Shortfall;
use crate::types::{serialize_outpoint, InscriptionUtxo};

/// Plan line for one inscription input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverableInscription {
    #[serde(serialize_with = "serialize_outpoint")]
    pub outpoint: OutPoint,
    pub value: u64,
    pub inscription_ids: Vec<String>,
    pub inscription_output: u64,
    pub payment_output: u64,
    pub recoverable_sats: u64,
    pub fee_share: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryAnalysis {
    pub recoverable: Vec<RecoverableInscription>,
    pub total_recoverable: u64,
    pub total_fee: u64,
    pub input_count: usize,
    pub output_count: usize,
    pub estimated_vsize: u64,
    pub worthwhile: bool,
    /// Present when the batch cannot be built at this fee rate
    pub shortfall: Option<Shortfall>,
}

/// Pure planner over an inscription UTXO snapshot. Performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct RecoveryAnalyzer {
    constants: RecoveryConstants,
}

impl RecoveryAnalyzer {
    pub fn new(constants: RecoveryConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &RecoveryConstants {
        &self.constants
    }

    /// Inscription UTXOs worth considering, in caller order.
    ///
    /// Order matters: the last candidate's payment output pays the batch fee.
    pub fn candidates<'a>(&self, utxos: &'a [InscriptionUtxo]) -> Vec<&'a InscriptionUtxo> {
        let min_value = self.constants.min_candidate_value();
        utxos.iter().filter(|u| u.value() > min_value).collect()
    }

    pub fn analyze(
        &self,
        utxos: &[InscriptionUtxo],
        fee_rate: FeeRate,
        target: &RecoveryTarget,
    ) -> RecoveryAnalysis {
        let candidates = self.candidates(utxos);
        // Inscriptions live on taproot outputs; the builder re-sizes from the live scripts
        let inputs: Vec<SizedInput> = candidates
            .iter()
            .map(|u| SizedInput::taproot(u.value(), &self.constants))
            .collect();
        let payment_kind = target.payment_kind();

        log::debug!(
            "{} of {} inscription UTXOs are recovery candidates",
            candidates.len(),
            utxos.len()
        );

        let allocation = match allocate(&inputs, fee_rate, payment_kind, &self.constants) {
            Ok(allocation) => allocation,
            Err(shortfall) => {
                log::info!(
                    "Recovery batch of {} inputs not viable: input {} short by {} sats at a {} sat fee",
                    candidates.len(),
                    shortfall.input_index,
                    shortfall.shortfall,
                    shortfall.batch_fee
                );
                return RecoveryAnalysis {
                    recoverable: Vec::new(),
                    total_recoverable: 0,
                    total_fee: shortfall.batch_fee,
                    input_count: candidates.len(),
                    output_count: candidates.len() * 2,
                    estimated_vsize: estimate_vsize(candidates.len(), payment_kind, &self.constants),
                    worthwhile: false,
                    shortfall: Some(shortfall),
                };
            }
        };

        let recoverable: Vec<RecoverableInscription> = candidates
            .iter()
            .zip(&allocation.lines)
            .map(|(utxo, line)| RecoverableInscription {
                outpoint: utxo.outpoint(),
                value: line.input_value,
                inscription_ids: utxo.inscription_ids.clone(),
                inscription_output: line.inscription_output,
                payment_output: line.payment_output,
                recoverable_sats: line
                    .payment_output
                    .saturating_sub(self.constants.payment_dust_sats),
                fee_share: line.fee_share,
            })
            .collect();

        let total_recoverable: u64 = recoverable.iter().map(|r| r.recoverable_sats).sum();
        let worthwhile = !recoverable.is_empty() && total_recoverable >= self.constants.min_worthwhile_sats;

        RecoveryAnalysis {
            total_recoverable,
            total_fee: allocation.fee,
            input_count: allocation.input_count(),
            output_count: allocation.output_count(),
            estimated_vsize: allocation.vsize,
            worthwhile,
            shortfall: None,
            recoverable,
        }
    }
}
