//! Payment sweeping.
//!
//! Converts funds accumulated at a forwarding address into a single
//! multi-output transaction following the recorded donation split. The
//! chain oracle abstracts the external block explorer; the sweeper itself
//! is a per-address state machine with exactly-once settlement.

pub mod error;
pub mod fee;
pub mod oracle;
pub mod outcome;
pub mod sweeper;

pub use error::OracleError;
pub use fee::{calculate_fee, allocate_outputs, DEFAULT_FEE_PER_KB, MIN_OUTPUT};
pub use oracle::{ChainOracle, HistoryEntry, HttpOracle};
pub use outcome::Outcome;
pub use sweeper::{PaymentSweeper, SweepConfig, SweepReport};
