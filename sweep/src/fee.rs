//! Fee estimation and output allocation.

use relaytip_crypto::TxOutput;
use relaytip_types::DonationSplit;

/// Smallest output value worth creating, in satoshis.
pub const MIN_OUTPUT: u64 = 5460;

/// Default miner fee per 1000 bytes, in satoshis.
pub const DEFAULT_FEE_PER_KB: u64 = 10_000;

/// Estimate the miner fee for a legacy transaction.
///
/// Uses the standard size heuristic of 148 bytes per input, 34 per output
/// and 10 of framing, rounded up to whole kilobytes.
pub fn calculate_fee(num_inputs: usize, num_outputs: usize, fee_per_kb: u64) -> u64 {
    let estimated_size = 148 * num_inputs as u64 + 34 * num_outputs as u64 + 10;
    estimated_size.div_ceil(1000) * fee_per_kb
}

/// Allocate `spendable` satoshis across the split.
///
/// Each recipient gets `floor(percent/100 × spendable)`. Shares below
/// `min_output` are dropped and their value redistributed pro-rata over the
/// retained outputs in a single pass. The retained outputs only grow, so
/// none can fall back under the threshold, and the floors guarantee the
/// final sum never exceeds `spendable`.
pub fn allocate_outputs(
    split: &DonationSplit,
    spendable: u64,
    min_output: u64,
) -> Vec<TxOutput> {
    let mut outputs = Vec::with_capacity(split.len());
    let mut discarded: u64 = 0;
    for (address, percent) in split.iter() {
        let value = (percent * 0.01 * spendable as f64).floor() as u64;
        if value >= min_output {
            outputs.push(TxOutput {
                address: address.clone(),
                value,
            });
        } else {
            discarded += value;
        }
    }

    if discarded > 0 && !outputs.is_empty() {
        let retained = spendable - discarded;
        for output in &mut outputs {
            let share = output.value as f64 / retained as f64;
            output.value += (share * discarded as f64).floor() as u64;
        }
    }

    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(shares: &[(&str, f64)]) -> DonationSplit {
        shares
            .iter()
            .map(|(a, p)| (a.to_string(), *p))
            .collect()
    }

    #[test]
    fn fee_matches_size_heuristic() {
        // 2 inputs, 3 outputs: 148*2 + 34*3 + 10 = 408 bytes, one kb bucket.
        assert_eq!(calculate_fee(2, 3, 10_000), 10_000);
        // 7 inputs push the estimate over 1000 bytes.
        assert_eq!(calculate_fee(7, 2, 10_000), 20_000);
        assert_eq!(calculate_fee(1, 1, 5_000), 5_000);
    }

    #[test]
    fn allocation_follows_percentages() {
        let outputs = allocate_outputs(&split(&[("a", 60.0), ("b", 40.0)]), 1_000_000, MIN_OUTPUT);
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].value, 600_000);
        assert_eq!(outputs[1].value, 400_000);
    }

    #[test]
    fn dust_share_redistributed() {
        // 40% of 10_000 is 4_000, under the threshold; the 60% output
        // absorbs it: 6_000 + floor(6_000/6_000 × 4_000) = 10_000.
        let outputs = allocate_outputs(&split(&[("a", 60.0), ("b", 40.0)]), 10_000, MIN_OUTPUT);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].address, "a");
        assert_eq!(outputs[0].value, 10_000);
    }

    #[test]
    fn all_dust_yields_no_outputs() {
        let outputs = allocate_outputs(
            &split(&[("a", 25.0), ("b", 25.0), ("c", 25.0), ("d", 25.0)]),
            10_000,
            MIN_OUTPUT,
        );
        assert!(outputs.is_empty());
    }

    #[test]
    fn sum_never_exceeds_spendable() {
        for spendable in [10_000u64, 33_333, 100_001, 5_000_000] {
            let outputs = allocate_outputs(
                &split(&[("a", 33.3), ("b", 33.3), ("c", 33.4)]),
                spendable,
                MIN_OUTPUT,
            );
            let total: u64 = outputs.iter().map(|o| o.value).sum();
            assert!(total <= spendable, "{total} > {spendable}");
            for output in &outputs {
                assert!(output.value >= MIN_OUTPUT);
            }
        }
    }

    #[test]
    fn zero_spendable_empty() {
        assert!(allocate_outputs(&split(&[("a", 100.0)]), 0, MIN_OUTPUT).is_empty());
    }
}
