//! Fundamental types for RelayTip.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: timestamps, transaction ids, and the donation split mapping
//! that a forwarding address is bound to.

pub mod split;
pub mod time;
pub mod txid;

pub use split::{DonationSplit, SplitError, SPLIT_SUM_TOLERANCE};
pub use time::Timestamp;
pub use txid::TxId;
