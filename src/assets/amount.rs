//! Big-integer token amounts
//!
//! The indexer packs balances as hex strings. They are decoded straight into [`BigUint`] and
//! leave the service as decimal strings; no floating point is involved at any step.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::Serializer;

/// Decode a `0x`-prefixed or bare hexadecimal string.
pub fn parse_hex(value: &str) -> Option<BigUint> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
}

/// Decode a hex string into a `u64`, rejecting values that do not fit.
pub fn parse_hex_u64(value: &str) -> Option<u64> {
    parse_hex(value)?.to_u64()
}

/// Render `raw / 10^divisibility`, dropping trailing fractional zeros and the decimal point
/// when nothing remains after it.
pub fn format_balance(raw: &BigUint, divisibility: u8) -> String {
    if divisibility == 0 {
        return raw.to_string();
    }

    let scale = BigUint::from(10u32).pow(u32::from(divisibility));
    let whole = raw / &scale;
    let fraction = raw % &scale;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", fraction.to_string(), width = divisibility as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

pub fn serialize_decimal<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0x64"), Some(BigUint::from(100u32)));
        assert_eq!(parse_hex("64"), Some(BigUint::from(100u32)));
        assert_eq!(parse_hex("0x0"), Some(BigUint::zero()));
        assert_eq!(parse_hex("0x"), None);
        assert_eq!(parse_hex("0xzz"), None);
    }

    #[test]
    fn test_parse_hex_beyond_u128() {
        // 2^160, well past anything an f64 or u128 could hold exactly
        let raw = parse_hex("0x10000000000000000000000000000000000000000").unwrap();
        assert_eq!(raw, BigUint::from(2u32).pow(160));
        assert_eq!(
            raw.to_string(),
            "1461501637330902918203684832716283019655932542976"
        );
    }

    #[test]
    fn test_parse_hex_u64_overflow() {
        assert_eq!(parse_hex_u64("0x2"), Some(2));
        assert_eq!(parse_hex_u64("0x10000000000000000"), None);
    }

    #[test]
    fn test_format_trims_to_whole() {
        let raw = parse_hex("0x64").unwrap();
        assert_eq!(format_balance(&raw, 2), "1");
    }

    #[test]
    fn test_format_fractions() {
        assert_eq!(format_balance(&BigUint::from(150u32), 2), "1.5");
        assert_eq!(format_balance(&BigUint::from(5u32), 3), "0.005");
        assert_eq!(format_balance(&BigUint::from(1_000_100u32), 4), "100.01");
        assert_eq!(format_balance(&BigUint::zero(), 8), "0");
        assert_eq!(format_balance(&BigUint::from(42u32), 0), "42");
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "serialize_decimal")]
            amount: BigUint,
        }
        let json = serde_json::to_string(&Wrapper {
            amount: BigUint::from(2u32).pow(70),
        })
        .unwrap();
        assert_eq!(json, r#"{"amount":"1180591620717411303424"}"#);
    }
}
