//! Deterministic one-time address creation.

use crate::error::LedgerError;
use relaytip_crypto::{derive_key, KeySeed};
use relaytip_store::{ForwardAddressRecord, LedgerStore, SpendState, StoreError};
use relaytip_types::{DonationSplit, Timestamp};
use std::sync::Arc;

/// The address ledger: wraps the record store with key derivation.
///
/// Every entry's derivation index equals its id, so the same seed always
/// regenerates the same address sequence. The store's `create` runs the
/// read-max-then-insert sequence under its writer lock; two concurrent
/// donation requests can therefore never derive the same index.
pub struct AddressLedger {
    store: Arc<dyn LedgerStore>,
    seed: KeySeed,
}

impl AddressLedger {
    pub fn new(store: Arc<dyn LedgerStore>, seed: KeySeed) -> Self {
        Self { store, seed }
    }

    /// Mint a new forwarding address bound to `split`.
    ///
    /// The split is validated (non-empty, sums to 100) and then copied
    /// verbatim into the record; it is immutable once persisted.
    pub fn create(&self, split: DonationSplit) -> Result<ForwardAddressRecord, LedgerError> {
        split.validate()?;

        let seed = &self.seed;
        let split_ref = &split;
        let record = self.store.create(&mut |id| {
            let key = derive_key(seed, id)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            Ok(ForwardAddressRecord {
                id,
                address: key.address,
                private_key: key.secret_hex,
                public_key: key.public_hex,
                outputs: split_ref.clone(),
                created: Timestamp::now(),
                status: SpendState::Unswept,
            })
        })?;

        tracing::info!(
            id = record.id,
            address = %record.address,
            recipients = record.outputs.len(),
            "created forwarding address"
        );
        Ok(record)
    }

    /// Look up a ledger entry by its forwarding address.
    pub fn get(&self, address: &str) -> Result<ForwardAddressRecord, LedgerError> {
        Ok(self.store.get(address)?)
    }

    /// All entries still awaiting a sweep.
    pub fn unswept(&self) -> Result<Vec<ForwardAddressRecord>, LedgerError> {
        Ok(self.store.unswept()?)
    }

    /// Total satoshis donated so far.
    pub fn running_total(&self) -> Result<u64, LedgerError> {
        Ok(self.store.running_total()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaytip_store::MemoryStore;

    fn ledger() -> AddressLedger {
        AddressLedger::new(
            Arc::new(MemoryStore::new()),
            KeySeed::new(b"ledger test seed".to_vec()),
        )
    }

    fn split() -> DonationSplit {
        let mut s = DonationSplit::new();
        s.add("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", 60.0);
        s.add("1BoatSLRHtKNngkdXEeobR76b53LETtpyT", 40.0);
        s
    }

    #[test]
    fn create_assigns_sequential_ids_and_unique_addresses() {
        let ledger = ledger();
        let a = ledger.create(split()).unwrap();
        let b = ledger.create(split()).unwrap();
        let c = ledger.create(split()).unwrap();

        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
        assert_ne!(a.address, b.address);
        assert_ne!(b.address, c.address);
        assert_ne!(a.private_key, b.private_key);
    }

    #[test]
    fn same_seed_same_index_same_address() {
        let a = ledger().create(split()).unwrap();
        let b = ledger().create(split()).unwrap();
        // Two fresh ledgers with the same seed both derive index 1.
        assert_eq!(a.address, b.address);
    }

    #[test]
    fn split_is_copied_verbatim() {
        let ledger = ledger();
        let record = ledger.create(split()).unwrap();
        assert_eq!(record.outputs, split());
        assert!(record.is_unswept());
    }

    #[test]
    fn invalid_split_rejected() {
        let ledger = ledger();
        let mut bad = DonationSplit::new();
        bad.add("1abc", 55.0);
        assert!(matches!(
            ledger.create(bad),
            Err(LedgerError::InvalidSplit(_))
        ));
        assert!(matches!(
            ledger.create(DonationSplit::new()),
            Err(LedgerError::InvalidSplit(_))
        ));
    }

    #[test]
    fn get_round_trips() {
        let ledger = ledger();
        let record = ledger.create(split()).unwrap();
        let fetched = ledger.get(&record.address).unwrap();
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.private_key, record.private_key);
    }
}
