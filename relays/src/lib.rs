//! Relay telemetry handling for RelayTip.
//!
//! Takes the relay details dataset and turns it into a ranked, weighted
//! donation selection:
//! - Filter chain selecting eligible relays (donation address required)
//! - Weight aggregation with optional grouping by country / AS / network family
//! - Ranking, top-N truncation, excluded/total summary rows
//! - Proportional donation share computation and split condensation

pub mod aggregate;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod query;
pub mod rank;
pub mod record;

pub use dataset::Dataset;
pub use error::RelayError;
pub use filter::RelayFilter;
pub use query::{QuerySpec, SortField};
pub use rank::{determine_relays, donation_split, rank, RankedResult, RankedSet};
pub use record::RelayRecord;
