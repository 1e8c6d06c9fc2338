//! Address resolution
//!
//! Addresses are decoded once per request into a [`ResolvedAddress`], which pins the network,
//! the output script, and the sizing class used by fee estimation.

use bitcoin::address::{Address, AddressType, NetworkUnchecked};
use bitcoin::{Network, ScriptBuf};
use serde::Serialize;
use std::str::FromStr;

use crate::error::RecoveryError;

/// Output script classes the recovery transaction can pay to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressKind {
    /// Segwit v1 key-path output (P2TR)
    Taproot,
    /// Segwit v0 single-key output (P2WPKH)
    SegwitV0,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    address: Address,
    kind: AddressKind,
}

/// Decode an address of any script type, requiring it to belong to `network`.
pub fn parse_for_network(address: &str, network: Network) -> Result<Address, RecoveryError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(RecoveryError::invalid_address(address, "address is empty"));
    }

    Address::<NetworkUnchecked>::from_str(trimmed)
        .map_err(|e| RecoveryError::invalid_address(address, e))?
        .require_network(network)
        .map_err(|e| RecoveryError::invalid_address(address, e))
}

impl ResolvedAddress {
    /// Decode an address for `network`, accepting P2TR and P2WPKH.
    pub fn parse(address: &str, network: Network) -> Result<Self, RecoveryError> {
        let checked = parse_for_network(address, network)?;

        let kind = match checked.address_type() {
            Some(AddressType::P2tr) => AddressKind::Taproot,
            Some(AddressType::P2wpkh) => AddressKind::SegwitV0,
            Some(other) => {
                return Err(RecoveryError::invalid_address(
                    address,
                    format!("unsupported script type {}, expected p2tr or p2wpkh", other),
                ))
            }
            None => {
                return Err(RecoveryError::invalid_address(
                    address,
                    "unknown script type, expected p2tr or p2wpkh",
                ))
            }
        };

        Ok(Self {
            address: checked,
            kind,
        })
    }

    /// Decode an address that must be taproot, such as the inscription destination.
    pub fn parse_taproot(address: &str, network: Network) -> Result<Self, RecoveryError> {
        let resolved = Self::parse(address, network)?;
        if resolved.kind != AddressKind::Taproot {
            return Err(RecoveryError::invalid_address(
                address,
                "inscriptions must be preserved at a taproot (p2tr) address",
            ));
        }
        Ok(resolved)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        self.address.script_pubkey()
    }
}

impl std::fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // BIP86 / BIP84 / BIP173 mainnet test vectors
    pub(crate) const TAPROOT: &str =
        "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";
    pub(crate) const P2WPKH: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";
    const P2WSH: &str = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";
    const P2PKH: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";

    #[test]
    fn test_resolves_taproot_and_p2wpkh() {
        let taproot = ResolvedAddress::parse(TAPROOT, Network::Bitcoin).unwrap();
        assert_eq!(taproot.kind(), AddressKind::Taproot);
        assert!(taproot.script_pubkey().is_p2tr());

        let segwit = ResolvedAddress::parse(P2WPKH, Network::Bitcoin).unwrap();
        assert_eq!(segwit.kind(), AddressKind::SegwitV0);
        assert!(segwit.script_pubkey().is_p2wpkh());
    }

    #[test]
    fn test_rejects_unsupported_script_types() {
        for addr in [P2WSH, P2PKH] {
            let err = ResolvedAddress::parse(addr, Network::Bitcoin).unwrap_err();
            assert!(matches!(err, RecoveryError::InvalidAddress { .. }), "{}", addr);
        }
    }

    #[test]
    fn test_rejects_wrong_network() {
        let err = ResolvedAddress::parse(TAPROOT, Network::Testnet).unwrap_err();
        assert!(matches!(err, RecoveryError::InvalidAddress { .. }));
    }

    #[test]
    fn test_rejects_garbage_and_empty() {
        assert!(ResolvedAddress::parse("bc1pnotanaddress", Network::Bitcoin).is_err());
        assert!(ResolvedAddress::parse("   ", Network::Bitcoin).is_err());
    }

    #[test]
    fn test_any_script_type_for_lookups() {
        assert!(parse_for_network(P2PKH, Network::Bitcoin).is_ok());
        assert!(parse_for_network(P2WSH, Network::Bitcoin).is_ok());
        assert!(parse_for_network(P2PKH, Network::Regtest).is_err());
    }

    #[test]
    fn test_taproot_only_parse() {
        assert!(ResolvedAddress::parse_taproot(TAPROOT, Network::Bitcoin).is_ok());
        assert!(ResolvedAddress::parse_taproot(P2WPKH, Network::Bitcoin).is_err());
    }
}
