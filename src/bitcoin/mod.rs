//! Bitcoin protocol helpers
//!
//! - Address resolution and script-type sizing classes
//! - Fee-rate arithmetic
//! - Broadcast relay for externally signed transactions

pub mod address;
pub mod broadcast;
pub mod fee;

// Re-export main types
pub use address::{parse_for_network, AddressKind, ResolvedAddress};
pub use broadcast::{Broadcaster, EsploraBroadcaster};
pub use fee::FeeRate;
