//! Inscription Recovery: UTXO analysis and PSBT construction for inscription-bearing outputs
//!
//! Inscriptions often sit on outputs holding far more than the sats they need. This crate
//! finds that surplus and builds one unsigned transaction that moves it to a payment address
//! while re-homing every inscription on a minimum-value taproot output.
//!
//! # Architecture
//!
//! - **Balance Client** ([`upstream`]): fetches a wallet's UTXO set from a JSON-RPC indexer
//! - **Asset Classifier** ([`assets`]): splits it into spendable, inscription, rune, alkane and pending buckets
//! - **Recovery Analyzer** ([`recovery::analyzer`]): sizes the batch and allocates the fee
//! - **Transaction Builder** ([`recovery::builder`]): re-checks parents on chain and emits a PSBT
//!
//! Signing happens elsewhere; [`api`] only relays already signed transactions.
//!
//! # Example
//!
//! ```ignore
//! use inscription_recovery::{RecoveryAnalyzer, RecoveryTarget, FeeRate};
//!
//! let target = RecoveryTarget::resolve(taproot, payment, network)?;
//! let analysis = RecoveryAnalyzer::default().analyze(&assets.inscriptions, FeeRate::from_sat_per_vb(2.0)?, &target);
//! if analysis.worthwhile {
//!     let inputs: Vec<_> = analysis.recoverable.iter().map(PlannedInput::from).collect();
//!     let unsigned = TransactionBuilder::new(&client, constants).build(&inputs, &target, rate).await?;
//!     println!("{}", unsigned.to_base64());
//! }
//! ```

pub mod api;
pub mod assets;
pub mod bitcoin;
pub mod config;
pub mod error;
pub mod recovery;
pub mod types;
pub mod upstream;

// Re-export main types
pub use crate::assets::{classify, CategorisedAssets};
pub use crate::bitcoin::{AddressKind, Broadcaster, EsploraBroadcaster, FeeRate, ResolvedAddress};
pub use crate::config::RecoveryConfig;
pub use crate::error::{RecoveryError, Shortfall};
pub use crate::recovery::{
    PlannedInput, RecoverableInscription, RecoveryAnalysis, RecoveryAnalyzer, RecoveryConstants,
    RecoveryTarget, TransactionBuilder, UnsignedRecovery,
};
pub use crate::types::{BaseUtxo, InscriptionUtxo, RuneBalance, TokenCategory, TokenUtxo};
pub use crate::upstream::{RpcClient, UtxoSource};
