//! JSON-file-backed ledger store.
//!
//! The whole store state is one JSON document, rewritten atomically
//! (write-to-temp then rename) after every mutation. Fine for the small
//! record counts a tip-forwarding deployment sees.

use crate::error::StoreError;
use crate::memory::StoreState;
use crate::record::ForwardAddressRecord;
use crate::LedgerStore;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub struct FileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file does not
    /// exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            serde_json::from_str(&contents)
                .map_err(|e| StoreError::Serialization(e.to_string()))?
        } else {
            StoreState::default()
        };
        state.after_load();
        tracing::debug!(path = %path.display(), "opened ledger store");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    /// Persist the current state. Called with the lock held so readers never
    /// observe a partially applied mutation.
    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::Backend(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

impl LedgerStore for FileStore {
    fn create(
        &self,
        build: &mut dyn FnMut(u64) -> Result<ForwardAddressRecord, StoreError>,
    ) -> Result<ForwardAddressRecord, StoreError> {
        let mut state = self.lock()?;
        let record = state.create(build)?;
        self.persist(&state)?;
        Ok(record)
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
        let mut state = self.lock()?;
        let record = state.seal(address, tx_id, amount)?;
        self.persist(&state)?;
        Ok(record)
    }

    fn mark_expired(&self, address: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.mark_expired(address)?;
        self.persist(&state)
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
    use crate::record::SpendState;
    use relaytip_types::{DonationSplit, Timestamp};

    fn build(id: u64) -> Result<ForwardAddressRecord, StoreError> {
        let mut outputs = DonationSplit::new();
        outputs.add("1dest", 100.0);
        Ok(ForwardAddressRecord {
            id,
            address: format!("1fwd{id}"),
            private_key: format!("priv{id}"),
            public_key: format!("pub{id}"),
            outputs,
            created: Timestamp::new(1000),
            status: SpendState::Unswept,
        })
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        {
            let store = FileStore::open(&path).unwrap();
            let a = store.create(&mut build).unwrap();
            store.create(&mut build).unwrap();
            store.seal(&a.address, "beef", 7000).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.running_total().unwrap(), 7000);
        assert!(store.get("1fwd1").unwrap().is_spent());

        // The id sequence continues after reopen.
        let next = store.create(&mut build).unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("fresh.json")).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.running_total().unwrap(), 0);
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
