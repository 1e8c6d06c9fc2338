use serde::{Deserialize, Serialize};

use crate::assets::CategorisedAssets;
use crate::bitcoin::FeeRate;
use crate::error::Shortfall;
use crate::recovery::{OutputDetail, RecoverableInscription, RecoveryAnalysis, UnsignedRecovery};
use crate::types::{BaseUtxo, IndexHeights, InscriptionUtxo, RuneBalance, TokenUtxo};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Wallet whose inscription UTXOs are analysed
    pub address: String,
    pub fee_rate: f64,
    /// Defaults to `address`
    pub taproot_address: Option<String>,
    /// Defaults to the taproot address
    pub payment_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub recoverable: Vec<PlanLine>,
    pub total_recoverable: u64,
    pub total_fee: u64,
    pub total_inputs: usize,
    pub total_outputs: usize,
    pub estimated_vsize: u64,
    pub worthwhile: bool,
    pub fee_rate: FeeRate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<Shortfall>,
}

impl AnalyzeResponse {
    pub fn new(analysis: RecoveryAnalysis, fee_rate: FeeRate) -> Self {
        Self {
            recoverable: analysis.recoverable.into_iter().map(PlanLine::from).collect(),
            total_recoverable: analysis.total_recoverable,
            total_fee: analysis.total_fee,
            total_inputs: analysis.input_count,
            total_outputs: analysis.output_count,
            estimated_vsize: analysis.estimated_vsize,
            worthwhile: analysis.worthwhile,
            fee_rate,
            shortfall: analysis.shortfall,
        }
    }
}

/// A plan line that can be fed back to `/build-psbt` as an input unchanged.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLine {
    #[serde(flatten)]
    pub line: RecoverableInscription,
    pub txid: String,
    pub vout: u32,
}

impl From<RecoverableInscription> for PlanLine {
    fn from(line: RecoverableInscription) -> Self {
        Self {
            txid: line.outpoint.txid.to_string(),
            vout: line.outpoint.vout,
            line,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInput {
    pub txid: String,
    pub vout: u32,
    /// Value the caller expects; the live parent output is authoritative
    pub value: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPsbtRequest {
    pub inputs: Vec<BuildInput>,
    pub taproot_address: String,
    pub payment_address: String,
    pub fee_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPsbtResponse {
    /// Base64-encoded unsigned PSBT
    pub psbt: String,
    pub summary: PsbtSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PsbtSummary {
    pub inputs: InputSummary,
    pub outputs: OutputSummary,
    pub fee: u64,
    pub estimated_vsize: u64,
    pub fee_rate: FeeRate,
}

#[derive(Debug, Serialize)]
pub struct InputSummary {
    pub count: usize,
    pub value: u64,
}

#[derive(Debug, Serialize)]
pub struct OutputSummary {
    pub count: usize,
    pub value: u64,
    pub details: Vec<OutputDetail>,
}

impl From<UnsignedRecovery> for BuildPsbtResponse {
    fn from(unsigned: UnsignedRecovery) -> Self {
        let psbt = unsigned.to_base64();
        let inputs = InputSummary {
            count: unsigned.inputs.len(),
            value: unsigned.total_input(),
        };
        let output_value = unsigned.total_output();

        Self {
            psbt,
            summary: PsbtSummary {
                inputs,
                outputs: OutputSummary {
                    count: unsigned.outputs.len(),
                    value: output_value,
                    details: unsigned.outputs,
                },
                fee: unsigned.fee,
                estimated_vsize: unsigned.vsize,
                fee_rate: unsigned.fee_rate,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayedBalance {
    #[serde(flatten)]
    pub balance: RuneBalance,
    pub display_balance: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUtxoResponse {
    #[serde(flatten)]
    pub utxo: BaseUtxo,
    pub balances: Vec<DisplayedBalance>,
}

impl From<TokenUtxo> for TokenUtxoResponse {
    fn from(token: TokenUtxo) -> Self {
        Self {
            utxo: token.utxo,
            balances: token
                .balances
                .into_iter()
                .map(|balance| DisplayedBalance {
                    display_balance: balance.display_balance(),
                    balance,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub address: String,
    pub spendable: Vec<BaseUtxo>,
    pub inscriptions: Vec<InscriptionUtxo>,
    pub runes: Vec<TokenUtxoResponse>,
    pub alkanes: Vec<TokenUtxoResponse>,
    pub pending: Vec<BaseUtxo>,
    pub heights: IndexHeights,
}

impl BalancesResponse {
    pub fn new(address: String, assets: CategorisedAssets) -> Self {
        Self {
            address,
            spendable: assets.spendable,
            inscriptions: assets.inscriptions,
            runes: assets.runes.into_iter().map(Into::into).collect(),
            alkanes: assets.alkanes.into_iter().map(Into::into).collect(),
            pending: assets.pending,
            heights: assets.heights,
        }
    }
}

/// Either a raw signed transaction or a finalized PSBT
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub tx_hex: Option<String>,
    pub psbt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub txid: String,
}
