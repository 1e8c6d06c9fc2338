use super::RecoveryConstants;
use crate::bitcoin::{AddressKind, FeeRate};
use crate::error::Shortfall;

/// An input to allocate, with the vbytes its spend adds to the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedInput {
    pub value: u64,
    pub vbytes: u64,
}

impl SizedInput {
    /// A key-path taproot spend.
    pub fn taproot(value: u64, constants: &RecoveryConstants) -> Self {
        Self {
            value,
            vbytes: constants.taproot_input_vbytes,
        }
    }
}

/// Outputs contributed by one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatedLine {
    pub input_value: u64,
    pub inscription_output: u64,
    pub payment_output: u64,
    /// Part of the batch fee taken from this line's payment output
    pub fee_share: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub lines: Vec<AllocatedLine>,
    pub vsize: u64,
    pub fee: u64,
}

impl Allocation {
    pub fn input_count(&self) -> usize {
        self.lines.len()
    }

    pub fn output_count(&self) -> usize {
        self.lines.len() * 2
    }

    pub fn total_input(&self) -> u64 {
        self.lines.iter().map(|l| l.input_value).sum()
    }

    pub fn total_output(&self) -> u64 {
        self.lines
            .iter()
            .map(|l| l.inscription_output + l.payment_output)
            .sum()
    }
}

/// Virtual size of a batch of `n_inputs` taproot inputs, each paired with one taproot
/// inscription output and one payment output of `payment_kind`.
pub fn estimate_vsize(n_inputs: usize, payment_kind: AddressKind, constants: &RecoveryConstants) -> u64 {
    batch_vsize(
        (n_inputs as u64).saturating_mul(constants.taproot_input_vbytes),
        n_inputs,
        payment_kind,
        constants,
    )
}

fn batch_vsize(
    input_vbytes: u64,
    n_inputs: usize,
    payment_kind: AddressKind,
    constants: &RecoveryConstants,
) -> u64 {
    let per_pair = constants.taproot_output_vbytes + constants.output_vbytes(payment_kind);
    constants
        .tx_overhead_vbytes
        .saturating_add(input_vbytes)
        .saturating_add((n_inputs as u64).saturating_mul(per_pair))
}

/// Split `inputs` (in batch order) into paired outputs.
///
/// Every input gets an inscription output of exactly `inscription_output_sats` and a payment
/// output of the remainder; the last input's payment output additionally pays the whole fee.
/// Fails if any payment output would fall below `payment_dust_sats`.
pub fn allocate(
    inputs: &[SizedInput],
    fee_rate: FeeRate,
    payment_kind: AddressKind,
    constants: &RecoveryConstants,
) -> Result<Allocation, Shortfall> {
    if inputs.is_empty() {
        return Ok(Allocation {
            lines: Vec::new(),
            vsize: 0,
            fee: 0,
        });
    }

    let input_vbytes = inputs
        .iter()
        .fold(0u64, |total, input| total.saturating_add(input.vbytes));
    let vsize = batch_vsize(input_vbytes, inputs.len(), payment_kind, constants);
    let fee = fee_rate.fee_for_vsize(vsize);
    let last = inputs.len() - 1;

    let mut lines = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let value = input.value;
        let fee_share = if index == last { fee } else { 0 };
        let required = constants
            .inscription_output_sats
            .saturating_add(fee_share)
            .saturating_add(constants.payment_dust_sats);

        if value < required {
            let payment_output =
                value as i128 - constants.inscription_output_sats as i128 - fee_share as i128;
            return Err(Shortfall {
                input_index: index,
                input_value: value,
                fee_absorbed: fee_share,
                batch_fee: fee,
                minimum_output: constants.payment_dust_sats,
                payment_output: payment_output.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
                shortfall: required - value,
            });
        }

        lines.push(AllocatedLine {
            input_value: value,
            inscription_output: constants.inscription_output_sats,
            payment_output: value - constants.inscription_output_sats - fee_share,
            fee_share,
        });
    }

    Ok(Allocation { lines, vsize, fee })
}
