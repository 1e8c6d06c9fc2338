//! Asset classification
//!
//! Turns the indexer's raw UTXO lists into spendable, inscription, rune, alkane and pending
//! buckets.

pub mod amount;
pub mod classify;

pub use classify::{classify, runes_activation_height, CategorisedAssets};

use bitcoin::Network;

use crate::error::RecoveryError;
use crate::upstream::UtxoSource;

/// Fetch a fresh UTXO snapshot for `address` and classify it.
pub async fn fetch_categorised<S: UtxoSource + ?Sized>(
    source: &S,
    address: &str,
    network: Network,
) -> Result<CategorisedAssets, RecoveryError> {
    let raw = source.fetch_balances(address).await?;
    Ok(classify(&raw, network))
}
