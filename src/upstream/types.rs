/// Indexer JSON-RPC wire types
///
/// These mirror the upstream payloads; they are translated into the domain model by the
/// asset classifier and never leave the service as-is.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AddressParams<'a> {
    pub address: &'a str,
}

/// Result of the balances method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBalances {
    #[serde(default)]
    pub spendable: Vec<RawUtxo>,
    #[serde(default)]
    pub assets: Vec<RawUtxo>,
    #[serde(default)]
    pub pending: Vec<RawUtxo>,
    #[serde(default, alias = "ordHeight")]
    pub ord_height: Option<u64>,
    #[serde(default, alias = "indexHeight", alias = "metashrewHeight")]
    pub index_height: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUtxo {
    /// `txid:vout`
    pub outpoint: String,
    pub value: u64,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub inscriptions: Vec<String>,
    /// Decoded entry by entry so one malformed balance cannot sink the whole response
    #[serde(default)]
    pub runes: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRuneBalance {
    pub rune: RawRune,
    /// Hex string (or plain number) amount in base units
    pub balance: NumericField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRune {
    pub id: RawRuneId,
    pub name: String,
    #[serde(default, alias = "spacedName")]
    pub spaced_name: Option<String>,
    #[serde(default)]
    pub divisibility: u8,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRuneId {
    pub block: NumericField,
    pub tx: NumericField,
}

/// Packed numeric field: hex text or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(u64),
    Text(String),
}

/// Esplora-style transaction, as returned by the transaction method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraTransaction {
    pub txid: String,
    #[serde(default)]
    pub vout: Vec<EsploraOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraOutput {
    pub scriptpubkey: String,
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}
