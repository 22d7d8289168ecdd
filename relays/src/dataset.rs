//! Loading and annotating the relay details dataset.

use crate::error::RelayError;
use crate::record::RelayRecord;
use serde::Deserialize;
use std::path::Path;

/// The relay details document: a list of relays plus its publication time.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub relays: Vec<RelayRecord>,
    #[serde(default)]
    pub relays_published: String,
}

impl Dataset {
    /// Load the dataset from a JSON file.
    ///
    /// A missing or unreadable file is fatal for the enclosing request
    /// (`DataUnavailable`), as is a malformed document.
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            RelayError::DataUnavailable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let dataset: Dataset = serde_json::from_str(&contents)?;
        tracing::debug!(
            relays = dataset.relays.len(),
            published = %dataset.relays_published,
            "loaded relay dataset"
        );
        Ok(dataset)
    }

    /// Fill in donation addresses from contact fields and drop relays that
    /// cannot participate in donation shares.
    ///
    /// Relays whose document already carries a `bitcoin_address` keep it;
    /// otherwise one is extracted from the contact field when present.
    /// Relays with a negative consensus weight fraction are removed.
    pub fn annotate(&mut self) {
        for relay in &mut self.relays {
            if relay.bitcoin_address.is_none() {
                relay.bitcoin_address = relay
                    .contact
                    .as_deref()
                    .and_then(relaytip_crypto::extract_address);
            }
        }
        self.relays
            .retain(|relay| relay.consensus_weight_fraction >= 0.0);
    }
}
