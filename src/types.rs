//! Shared UTXO data model
//!
//! Snapshots produced from a single upstream balance fetch. Nothing here is persisted or
//! mutated after construction; every request re-fetches.

use bitcoin::OutPoint;
use num_bigint::BigUint;
use serde::Serialize;

use crate::assets::amount;

/// A plain UTXO as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseUtxo {
    #[serde(serialize_with = "serialize_outpoint")]
    pub outpoint: OutPoint,
    pub value: u64,
    pub confirmation_height: Option<u64>,
}

/// A UTXO carrying at least one inscription.
///
/// Spending it without a replacement inscription-preserving output moves the inscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscriptionUtxo {
    #[serde(flatten)]
    pub utxo: BaseUtxo,
    pub inscription_ids: Vec<String>,
}

impl InscriptionUtxo {
    pub fn outpoint(&self) -> OutPoint {
        self.utxo.outpoint
    }

    pub fn value(&self) -> u64 {
        self.utxo.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Rune,
    Alkane,
}

/// `block:tx` identifier of a rune or alkane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RuneId {
    pub block: u64,
    pub tx: u32,
}

impl std::fmt::Display for RuneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.block, self.tx)
    }
}

/// A fungible token balance attached to a UTXO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuneBalance {
    pub category: TokenCategory,
    pub rune_id: RuneId,
    pub name: String,
    pub symbol: Option<String>,
    pub divisibility: u8,
    #[serde(serialize_with = "amount::serialize_decimal")]
    pub raw_balance: BigUint,
}

impl RuneBalance {
    /// `raw_balance` scaled down by `divisibility`, trailing fractional zeros trimmed.
    pub fn display_balance(&self) -> String {
        amount::format_balance(&self.raw_balance, self.divisibility)
    }
}

/// UTXO together with the token balances of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUtxo {
    #[serde(flatten)]
    pub utxo: BaseUtxo,
    pub balances: Vec<RuneBalance>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexHeights {
    pub ord_height: Option<u64>,
    pub index_height: Option<u64>,
}

pub(crate) fn serialize_outpoint<S>(outpoint: &OutPoint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(outpoint)
}
