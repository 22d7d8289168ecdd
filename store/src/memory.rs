//! In-memory ledger store (tests and one-shot tooling).

use crate::error::StoreError;
use crate::record::{ForwardAddressRecord, SpendState};
use crate::LedgerStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// The shared store state. One writer lock serializes every mutation, which
/// is what makes `create` and `seal` atomic units.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    /// Next id to hand out. Ids are never reused, even though records are
    /// never deleted in normal operation.
    next_id: u64,
    total_donated: u64,
    entries: BTreeMap<u64, ForwardAddressRecord>,
}

impl StoreState {
    pub(crate) fn after_load(&mut self) {
        // Guard the sequence against a file that predates some entries.
        let max_plus_one = self
            .entries
            .keys()
            .next_back()
            .map(|max| max + 1)
            .unwrap_or(1);
        self.next_id = self.next_id.max(max_plus_one).max(1);
    }

    pub(crate) fn create(
        &mut self,
        build: &mut dyn FnMut(u64) -> Result<ForwardAddressRecord, StoreError>,
    ) -> Result<ForwardAddressRecord, StoreError> {
        let id = self.next_id.max(1);
        let record = build(id)?;

        for existing in self.entries.values() {
            if existing.address == record.address {
                return Err(StoreError::Duplicate(record.address));
            }
            if existing.private_key == record.private_key
                || existing.public_key == record.public_key
            {
                return Err(StoreError::Duplicate(format!("keys for id {id}")));
            }
        }

        self.entries.insert(id, record.clone());
        self.next_id = id + 1;
        Ok(record)
    }

    fn find_mut(&mut self, address: &str) -> Result<&mut ForwardAddressRecord, StoreError> {
        self.entries
            .values_mut()
            .find(|r| r.address == address)
            .ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    pub(crate) fn get(&self, address: &str) -> Result<ForwardAddressRecord, StoreError> {
        self.entries
            .values()
            .find(|r| r.address == address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    pub(crate) fn unswept(&self) -> Vec<ForwardAddressRecord> {
        self.entries
            .values()
            .filter(|r| r.is_unswept())
            .cloned()
            .collect()
    }

    pub(crate) fn seal(
        &mut self,
        address: &str,
        tx_id: &str,
        amount: u64,
    ) -> Result<ForwardAddressRecord, StoreError> {
        let record = self.find_mut(address)?;
        if record.status != SpendState::Unswept {
            return Err(StoreError::Conflict(format!(
                "address {address} is not unswept"
            )));
        }
        record.status = SpendState::Spent {
            spending_tx: tx_id.to_string(),
            donation_amount: amount,
        };
        let sealed = record.clone();
        self.total_donated += amount;
        Ok(sealed)
    }

    pub(crate) fn mark_expired(&mut self, address: &str) -> Result<(), StoreError> {
        let record = self.find_mut(address)?;
        match record.status {
            SpendState::Unswept => {
                record.status = SpendState::Expired;
                Ok(())
            }
            SpendState::Expired => Ok(()),
            SpendState::Spent { .. } => Err(StoreError::Conflict(format!(
                "address {address} is already spent"
            ))),
        }
    }

    pub(crate) fn total_donated(&self) -> u64 {
        self.total_donated
    }

    pub(crate) fn count(&self) -> u64 {
        self.entries.len() as u64
    }
}

/// A purely in-memory [`LedgerStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn create(
        &self,
        build: &mut dyn FnMut(u64) -> Result<ForwardAddressRecord, StoreError>,
    ) -> Result<ForwardAddressRecord, StoreError> {
        self.lock()?.create(build)
    }

    fn get(&self, address: &str) -> Result<ForwardAddressRecord, StoreError> {
        self.lock()?.get(address)
    }

    fn unswept(&self) -> Result<Vec<ForwardAddressRecord>, StoreError> {
        Ok(self.lock()?.unswept())
    }

    fn seal(
        &self,
        address: &str,
        tx_id: &str,
        amount: u64,
    ) -> Result<ForwardAddressRecord, StoreError> {
        self.lock()?.seal(address, tx_id, amount)
    }

    fn mark_expired(&self, address: &str) -> Result<(), StoreError> {
        self.lock()?.mark_expired(address)
    }

    fn running_total(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.total_donated())
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaytip_types::{DonationSplit, Timestamp};

    fn builder(suffix: char) -> impl FnMut(u64) -> Result<ForwardAddressRecord, StoreError> {
        move |id| {
            let mut outputs = DonationSplit::new();
            outputs.add("1dest", 100.0);
            Ok(ForwardAddressRecord {
                id,
                address: format!("1fwd{id}{suffix}"),
                private_key: format!("priv{id}{suffix}"),
                public_key: format!("pub{id}{suffix}"),
                outputs,
                created: Timestamp::new(1000),
                status: SpendState::Unswept,
            })
        }
    }

    #[test]
    fn ids_form_gapless_increasing_sequence() {
        let store = MemoryStore::new();
        for expected in 1..=5u64 {
            let record = store.create(&mut builder('a')).unwrap();
            assert_eq!(record.id, expected);
        }
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn duplicate_address_rejected() {
        let store = MemoryStore::new();
        store.create(&mut builder('a')).unwrap();
        // A builder that ignores the id and repeats the first address.
        let mut clash = |_: u64| builder('a')(1);
        let result = store.create(&mut clash);
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn seal_transitions_once_and_tallies() {
        let store = MemoryStore::new();
        let record = store.create(&mut builder('a')).unwrap();

        let sealed = store.seal(&record.address, "beef", 5000).unwrap();
        assert!(sealed.is_spent());
        assert_eq!(store.running_total().unwrap(), 5000);

        // Second seal must conflict without touching the total.
        let again = store.seal(&record.address, "beef", 5000);
        assert!(matches!(again, Err(StoreError::Conflict(_))));
        assert_eq!(store.running_total().unwrap(), 5000);
    }

    #[test]
    fn unswept_excludes_sealed_and_expired() {
        let store = MemoryStore::new();
        let a = store.create(&mut builder('a')).unwrap();
        let b = store.create(&mut builder('b')).unwrap();
        let c = store.create(&mut builder('c')).unwrap();

        store.seal(&a.address, "beef", 100).unwrap();
        store.mark_expired(&b.address).unwrap();

        let unswept = store.unswept().unwrap();
        assert_eq!(unswept.len(), 1);
        assert_eq!(unswept[0].address, c.address);
    }

    #[test]
    fn expired_cannot_be_sealed() {
        let store = MemoryStore::new();
        let record = store.create(&mut builder('a')).unwrap();
        store.mark_expired(&record.address).unwrap();
        assert!(matches!(
            store.seal(&record.address, "beef", 100),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn get_unknown_address_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("1nothere"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn builder_error_leaves_sequence_untouched() {
        let store = MemoryStore::new();
        let mut failing = |_: u64| Err(StoreError::Backend("derivation failed".into()));
        assert!(store.create(&mut failing).is_err());
        let record = store.create(&mut builder('a')).unwrap();
        assert_eq!(record.id, 1);
    }
}
