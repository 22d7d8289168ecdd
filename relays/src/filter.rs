//! Relay selection filters.
//!
//! A filter chain is a sequential logical AND of predicates over relay
//! records; every filter is a pure predicate so the chain's outcome is
//! independent of application order.

use crate::query::QuerySpec;
use crate::record::RelayRecord;

/// A single relay predicate.
#[derive(Clone, Debug)]
pub enum RelayFilter {
    /// The base filter: only relays with a donation address participate.
    HasDonationAddress,
    /// Country membership, case-insensitive (codes stored lowercased).
    Country(Vec<String>),
    /// Exit relays: positive exit probability.
    Exit,
    /// Guard relays: positive guard probability.
    Guard,
    /// Complement of another filter relative to the full input set.
    Inverse(Box<RelayFilter>),
}

impl RelayFilter {
    pub fn accept(&self, relay: &RelayRecord) -> bool {
        match self {
            Self::HasDonationAddress => relay.bitcoin_address.is_some(),
            Self::Country(countries) => countries.contains(&relay.country_lower()),
            Self::Exit => relay.exit_probability > 0.0,
            Self::Guard => relay.guard_probability > 0.0,
            Self::Inverse(inner) => !inner.accept(relay),
        }
    }
}

/// Build the filter chain for a query. The donation-address filter is always
/// applied first.
pub fn chain_for(spec: &QuerySpec) -> Vec<RelayFilter> {
    let mut filters = vec![RelayFilter::HasDonationAddress];
    if !spec.country.is_empty() {
        filters.push(RelayFilter::Country(
            spec.country.iter().map(|c| c.to_lowercase()).collect(),
        ));
    }
    if spec.exits_only {
        filters.push(RelayFilter::Exit);
    }
    if spec.guards_only {
        filters.push(RelayFilter::Guard);
    }
    filters
}

/// Apply a chain to a dataset, keeping relays every filter accepts.
pub fn apply<'a>(filters: &[RelayFilter], relays: &'a [RelayRecord]) -> Vec<&'a RelayRecord> {
    relays
        .iter()
        .filter(|relay| filters.iter().all(|f| f.accept(relay)))
        .collect()
}
