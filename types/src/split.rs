//! The donation split a forwarding address is bound to.
//!
//! A split maps each recipient bitcoin address to its percentage share of a
//! forwarded payment. Splits are captured when a ledger entry is created and
//! are immutable thereafter; shares must sum to 100 within floating
//! tolerance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Tolerance when checking that split percentages sum to 100.
pub const SPLIT_SUM_TOLERANCE: f64 = 1e-6;

/// Errors from split validation.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("donation split has no recipients")]
    Empty,

    #[error("donation split percentages sum to {sum}, expected 100")]
    BadSum { sum: f64 },
}

/// An address → percentage mapping.
///
/// Backed by a `BTreeMap` so iteration order (and therefore transaction
/// output order) is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationSplit(BTreeMap<String, f64>);

impl DonationSplit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a share for an address, accumulating if the address already has one.
    pub fn add(&mut self, address: impl Into<String>, share: f64) {
        *self.0.entry(address.into()).or_insert(0.0) += share;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    /// Sum of all percentage shares.
    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Check the split is non-empty and sums to 100 within tolerance.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.0.is_empty() {
            return Err(SplitError::Empty);
        }
        let sum = self.sum();
        if (sum - 100.0).abs() > SPLIT_SUM_TOLERANCE {
            return Err(SplitError::BadSum { sum });
        }
        Ok(())
    }
}

impl FromIterator<(String, f64)> for DonationSplit {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut split = Self::new();
        for (address, share) in iter {
            split.add(address, share);
        }
        split
    }
}
