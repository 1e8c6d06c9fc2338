use bitcoin::{Network, OutPoint};
use serde::Serialize;
use std::str::FromStr;

use super::amount;
use crate::types::{
    BaseUtxo, IndexHeights, InscriptionUtxo, RuneBalance, RuneId, TokenCategory, TokenUtxo,
};
use crate::upstream::types::{NumericField, RawBalances, RawRuneBalance, RawUtxo};

/// Name/symbol token marking a protorune-style alkane balance.
const ALKANE_MARKER: &str = "alkane";

/// A wallet's UTXO set split into buckets. Buckets are not exclusive: one output may be
/// inscription-bearing and carry rune and alkane balances at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorisedAssets {
    pub spendable: Vec<BaseUtxo>,
    pub inscriptions: Vec<InscriptionUtxo>,
    pub runes: Vec<TokenUtxo>,
    pub alkanes: Vec<TokenUtxo>,
    pub pending: Vec<BaseUtxo>,
    pub heights: IndexHeights,
}

/// First block at which runes exist on `network`.
pub fn runes_activation_height(network: Network) -> u64 {
    match network {
        Network::Bitcoin => 840_000,
        Network::Testnet => 2_520_000,
        _ => 0,
    }
}

/// Split a raw balances response into categorised buckets.
///
/// Malformed records are dropped with a warning; they never abort the rest of the set.
pub fn classify(raw: &RawBalances, network: Network) -> CategorisedAssets {
    let activation_height = runes_activation_height(network);
    let mut assets = CategorisedAssets {
        heights: IndexHeights {
            ord_height: raw.ord_height,
            index_height: raw.index_height,
        },
        ..Default::default()
    };

    assets.spendable = raw.spendable.iter().filter_map(base_utxo).collect();
    assets.pending = raw.pending.iter().filter_map(base_utxo).collect();

    for entry in &raw.assets {
        let Some(utxo) = base_utxo(entry) else {
            continue;
        };

        let mut classified = false;

        if !entry.inscriptions.is_empty() {
            assets.inscriptions.push(InscriptionUtxo {
                utxo: utxo.clone(),
                inscription_ids: entry.inscriptions.clone(),
            });
            classified = true;
        }

        let (alkanes, runes): (Vec<_>, Vec<_>) = entry
            .runes
            .iter()
            .filter_map(|value| decode_balance(&utxo.outpoint, value, activation_height))
            .partition(|balance| balance.category == TokenCategory::Alkane);

        if !runes.is_empty() {
            assets.runes.push(TokenUtxo {
                utxo: utxo.clone(),
                balances: runes,
            });
            classified = true;
        }
        if !alkanes.is_empty() {
            assets.alkanes.push(TokenUtxo {
                utxo: utxo.clone(),
                balances: alkanes,
            });
            classified = true;
        }

        if !classified {
            log::debug!("Asset UTXO {} carries no recognised assets", utxo.outpoint);
        }
    }

    log::debug!(
        "Classified {} spendable, {} inscription, {} rune, {} alkane, {} pending UTXOs",
        assets.spendable.len(),
        assets.inscriptions.len(),
        assets.runes.len(),
        assets.alkanes.len(),
        assets.pending.len()
    );

    assets
}

/// Alkane if the id predates runes activation or the name carries the alkane marker.
pub fn categorise(rune_id: RuneId, name: &str, symbol: Option<&str>, activation_height: u64) -> TokenCategory {
    if rune_id.block < activation_height {
        return TokenCategory::Alkane;
    }
    let marked = |text: &str| text.to_lowercase().contains(ALKANE_MARKER);
    if marked(name) || symbol.is_some_and(marked) {
        TokenCategory::Alkane
    } else {
        TokenCategory::Rune
    }
}

fn base_utxo(raw: &RawUtxo) -> Option<BaseUtxo> {
    match OutPoint::from_str(&raw.outpoint) {
        Ok(outpoint) => Some(BaseUtxo {
            outpoint,
            value: raw.value,
            confirmation_height: raw.height,
        }),
        Err(e) => {
            log::warn!("Dropping UTXO with malformed outpoint '{}': {}", raw.outpoint, e);
            None
        }
    }
}

fn decode_balance(
    outpoint: &OutPoint,
    value: &serde_json::Value,
    activation_height: u64,
) -> Option<RuneBalance> {
    let raw: RawRuneBalance = match serde_json::from_value(value.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Dropping malformed rune balance on {}: {}", outpoint, e);
            return None;
        }
    };

    let block = numeric_u64(&raw.rune.id.block);
    let tx = numeric_u64(&raw.rune.id.tx).and_then(|tx| u32::try_from(tx).ok());
    let (Some(block), Some(tx)) = (block, tx) else {
        log::warn!(
            "Dropping rune balance on {} with malformed id {:?}",
            outpoint,
            raw.rune.id
        );
        return None;
    };

    let Some(raw_balance) = numeric_big(&raw.balance) else {
        log::warn!(
            "Dropping rune balance {} on {} with malformed amount {:?}",
            raw.rune.name,
            outpoint,
            raw.balance
        );
        return None;
    };

    let rune_id = RuneId { block, tx };
    let name = raw.rune.spaced_name.unwrap_or(raw.rune.name);
    let category = categorise(rune_id, &name, raw.rune.symbol.as_deref(), activation_height);

    Some(RuneBalance {
        category,
        rune_id,
        name,
        symbol: raw.rune.symbol,
        divisibility: raw.rune.divisibility,
        raw_balance,
    })
}

fn numeric_u64(field: &NumericField) -> Option<u64> {
    match field {
        NumericField::Number(n) => Some(*n),
        NumericField::Text(text) => amount::parse_hex_u64(text),
    }
}

fn numeric_big(field: &NumericField) -> Option<num_bigint::BigUint> {
    match field {
        NumericField::Number(n) => Some((*n).into()),
        NumericField::Text(text) => amount::parse_hex(text),
    }
}
