//! Storage for RelayTip ledger records.
//!
//! The core treats persistence as a transactional record store behind the
//! [`LedgerStore`] trait. Two backends are provided: an in-memory store for
//! tests and a JSON-file-backed store for the daemon. Both serialize the two
//! operations with real invariants — "take next id and insert" and "seal and
//! add to the running total" — under a single writer lock.

pub mod error;
pub mod file;
pub mod memory;
pub mod record;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{ForwardAddressRecord, SpendState};

/// The transactional record store the ledger and sweeper operate on.
pub trait LedgerStore: Send + Sync {
    /// Atomically allocate the next derivation id (max existing + 1, never
    /// reused) and insert the record the builder produces for it.
    ///
    /// Fails with [`StoreError::Duplicate`] if the built record's address,
    /// private key, or public key collides with an existing entry.
    fn create(
        &self,
        build: &mut dyn FnMut(u64) -> Result<ForwardAddressRecord, StoreError>,
    ) -> Result<ForwardAddressRecord, StoreError>;

    /// Fetch a record by its forwarding address.
    fn get(&self, address: &str) -> Result<ForwardAddressRecord, StoreError>;

    /// All records still in the `Unswept` state.
    fn unswept(&self) -> Result<Vec<ForwardAddressRecord>, StoreError>;

    /// Atomically transition a record to `Spent` and add the swept amount to
    /// the running total. Exactly-once: a record that is already spent (or
    /// expired) yields [`StoreError::Conflict`] and the total is untouched.
    fn seal(
        &self,
        address: &str,
        tx_id: &str,
        amount: u64,
    ) -> Result<ForwardAddressRecord, StoreError>;

    /// Mark a stale unswept record as permanently ineligible.
    fn mark_expired(&self, address: &str) -> Result<(), StoreError>;

    /// Total satoshis donated across all sealed records.
    fn running_total(&self) -> Result<u64, StoreError>;

    /// Number of records in the store.
    fn count(&self) -> Result<u64, StoreError>;
}
