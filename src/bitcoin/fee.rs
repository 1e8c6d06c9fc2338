//! Fee-rate arithmetic
//!
//! Rates arrive as decimal sat/vB and are held as an exact decimal `mantissa * 10^exponent`,
//! so `fee_for_vsize` is `ceil(vsize * rate)` with no floating-point rounding.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Serialize, Serializer};

use crate::error::RecoveryError;

/// Exact decimal rate in sat/vB, normalised so equal rates compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeeRate {
    mantissa: u64,
    exponent: i32,
}

impl FeeRate {
    /// Take a caller-supplied sat/vB rate at the shortest decimal that reproduces it.
    ///
    /// `1.1` is held as `11 * 10^-1`, not as the nearest binary fraction.
    pub fn from_sat_per_vb(rate: f64) -> Result<Self, RecoveryError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(RecoveryError::InvalidInput(format!(
                "fee rate must be a positive number of sat/vB, got {}",
                rate
            )));
        }

        let malformed = || RecoveryError::Internal(format!("cannot decompose fee rate {}", rate));

        // Shortest round-trip scientific form, e.g. "1.0004e0" or "4e-4"
        let scientific = format!("{:e}", rate);
        let (digits, exponent) = scientific.split_once('e').ok_or_else(malformed)?;
        let exponent: i32 = exponent.parse().map_err(|_| malformed())?;
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let mantissa: u64 = format!("{}{}", whole, fraction)
            .parse()
            .map_err(|_| malformed())?;
        let fraction_digits = i32::try_from(fraction.len()).map_err(|_| malformed())?;

        Ok(Self::normalised(mantissa, exponent - fraction_digits))
    }

    pub const fn from_sat_per_vb_u64(rate: u64) -> Self {
        Self::normalised(rate, 0)
    }

    const fn normalised(mut mantissa: u64, mut exponent: i32) -> Self {
        while mantissa != 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            exponent += 1;
        }
        Self { mantissa, exponent }
    }

    pub fn as_sat_per_vb(&self) -> f64 {
        // Parsing the decimal form is correctly rounded, unlike scaling by powers of ten
        format!("{}e{}", self.mantissa, self.exponent)
            .parse()
            .unwrap_or(f64::NAN)
    }

    /// `ceil(vsize * rate)` in whole sats, saturating at `u64::MAX`.
    pub fn fee_for_vsize(&self, vsize: u64) -> u64 {
        let product = BigUint::from(vsize) * self.mantissa;
        let fee = if self.exponent >= 0 {
            product * BigUint::from(10u32).pow(self.exponent.unsigned_abs())
        } else {
            let scale = BigUint::from(10u32).pow(self.exponent.unsigned_abs());
            (product + &scale - 1u32) / scale
        };
        fee.to_u64().unwrap_or(u64::MAX)
    }
}

impl Serialize for FeeRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_sat_per_vb())
    }
}
