//! Upstream indexer access
//!
//! The service reads everything it knows about a wallet from a remote indexer. The
//! [`UtxoSource`] trait is the seam; [`RpcClient`] is the JSON-RPC implementation.

pub mod client;
pub mod types;

use async_trait::async_trait;
use bitcoin::Txid;

use crate::error::RecoveryError;

pub use client::RpcClient;
pub use types::{EsploraOutput, EsploraTransaction, RawBalances, RawUtxo};

/// Point-in-time view of wallet UTXOs and their parent transactions.
#[async_trait]
pub trait UtxoSource: Send + Sync {
    /// Spendable, asset-bearing and pending UTXOs of `address`.
    async fn fetch_balances(&self, address: &str) -> Result<RawBalances, RecoveryError>;

    /// The transaction `txid`, or `None` when the indexer does not know it.
    async fn fetch_transaction(
        &self,
        txid: &Txid,
    ) -> Result<Option<EsploraTransaction>, RecoveryError>;
}
