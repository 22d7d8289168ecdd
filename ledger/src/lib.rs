//! The forwarding-address ledger.
//!
//! Mints one-time deterministic receiving addresses bound to an immutable
//! payout split, and decides which entries are still eligible for sweeping.

pub mod error;
pub mod expiry;
pub mod ledger;

pub use error::LedgerError;
pub use expiry::ExpiryPolicy;
pub use ledger::AddressLedger;
