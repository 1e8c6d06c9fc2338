//! Inscription recovery
//!
//! Plans and builds a single consolidating transaction that re-homes every selected inscription
//! at a minimum-value taproot output and pays the surplus to a payment address.
//!
//! Each input `i` produces, in order, an inscription output then a payment output. Only the
//! payment output of the last input pays the batch fee. Both the analyzer and the builder go
//! through [`allocation::allocate`], so their numbers cannot drift apart.

pub mod allocation;
pub mod analyzer;
pub mod builder;

pub use allocation::{allocate, estimate_vsize, Allocation, AllocatedLine, SizedInput};
pub use analyzer::{RecoverableInscription, RecoveryAnalysis, RecoveryAnalyzer};
pub use builder::{OutputDetail, OutputRole, PlannedInput, TransactionBuilder, UnsignedRecovery};

use bitcoin::{Network, Script};
use serde::Serialize;

use crate::bitcoin::{AddressKind, ResolvedAddress};
use crate::error::RecoveryError;

/// Dust limits, vbyte costs and thresholds used by planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryConstants {
    /// Value of each inscription-preserving output
    pub inscription_output_sats: u64,
    /// Minimum value of a payment output
    pub payment_dust_sats: u64,
    /// Smallest total recovery worth a transaction
    pub min_worthwhile_sats: u64,
    pub tx_overhead_vbytes: u64,
    pub taproot_input_vbytes: u64,
    pub p2wpkh_input_vbytes: u64,
    pub taproot_output_vbytes: u64,
    pub p2wpkh_output_vbytes: u64,
}

impl RecoveryConstants {
    /// Inputs at or below this value can never yield a positive recovery.
    pub fn min_candidate_value(&self) -> u64 {
        self.inscription_output_sats + self.payment_dust_sats
    }

    pub fn output_vbytes(&self, kind: AddressKind) -> u64 {
        match kind {
            AddressKind::Taproot => self.taproot_output_vbytes,
            AddressKind::SegwitV0 => self.p2wpkh_output_vbytes,
        }
    }

    /// Spend size of an output with `script_pubkey`, for the script types a PSBT can carry
    /// as a witness UTXO and whose witness size is known up front.
    pub fn input_vbytes(&self, script_pubkey: &Script) -> Option<u64> {
        if script_pubkey.is_p2tr() {
            Some(self.taproot_input_vbytes)
        } else if script_pubkey.is_p2wpkh() {
            Some(self.p2wpkh_input_vbytes)
        } else {
            None
        }
    }
}

impl Default for RecoveryConstants {
    fn default() -> Self {
        Self {
            inscription_output_sats: 330,
            payment_dust_sats: 546,
            min_worthwhile_sats: 1_000,
            tx_overhead_vbytes: 10,
            taproot_input_vbytes: 58,
            p2wpkh_input_vbytes: 68,
            taproot_output_vbytes: 43,
            p2wpkh_output_vbytes: 31,
        }
    }
}

/// Where recovered value goes: inscriptions to `taproot`, surplus to `payment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTarget {
    pub taproot: ResolvedAddress,
    pub payment: ResolvedAddress,
}

impl RecoveryTarget {
    pub fn resolve(taproot: &str, payment: &str, network: Network) -> Result<Self, RecoveryError> {
        Ok(Self {
            taproot: ResolvedAddress::parse_taproot(taproot, network)?,
            payment: ResolvedAddress::parse(payment, network)?,
        })
    }

    pub fn payment_kind(&self) -> AddressKind {
        self.payment.kind()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bitcoin::address::tests::{P2WPKH, TAPROOT};

    pub(crate) fn taproot_target() -> RecoveryTarget {
        RecoveryTarget::resolve(TAPROOT, TAPROOT, Network::Bitcoin).unwrap()
    }

    pub(crate) fn segwit_target() -> RecoveryTarget {
        RecoveryTarget::resolve(TAPROOT, P2WPKH, Network::Bitcoin).unwrap()
    }

    #[test]
    fn test_default_constants() {
        let constants = RecoveryConstants::default();
        assert_eq!(constants.min_candidate_value(), 876);
        assert_eq!(constants.output_vbytes(AddressKind::Taproot), 43);
        assert_eq!(constants.output_vbytes(AddressKind::SegwitV0), 31);
    }

    #[test]
    fn test_input_vbytes_by_script() {
        let constants = RecoveryConstants::default();
        let taproot = taproot_target();
        let segwit = segwit_target();
        assert_eq!(constants.input_vbytes(&taproot.taproot.script_pubkey()), Some(58));
        assert_eq!(constants.input_vbytes(&segwit.payment.script_pubkey()), Some(68));
        // P2WSH witness size depends on the script
        let p2wsh = bitcoin::ScriptBuf::from_hex(
            "00201863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262",
        )
        .unwrap();
        assert_eq!(constants.input_vbytes(&p2wsh), None);
    }

    #[test]
    fn test_target_requires_taproot_inscription_address() {
        assert!(RecoveryTarget::resolve(P2WPKH, TAPROOT, Network::Bitcoin).is_err());
        assert_eq!(segwit_target().payment_kind(), AddressKind::SegwitV0);
        assert_eq!(taproot_target().payment_kind(), AddressKind::Taproot);
    }
}
