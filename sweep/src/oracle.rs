//! External chain oracle.
//!
//! The sweeper needs two things from the outside world: the transaction
//! history of an address and a way to broadcast a raw transaction. Both sit
//! behind [`ChainOracle`] so tests can substitute a scripted oracle.

use crate::error::OracleError;
use relaytip_types::TxId;
use serde::Deserialize;
use std::time::Duration;

/// One funding output in an address's history.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryEntry {
    /// Transaction id of the funding transaction (display hex).
    pub tx_hash: String,
    /// Index of the output paying the address.
    pub output_index: u32,
    /// Output value in satoshis.
    pub value: u64,
    /// Transaction id that spent this output, if any.
    #[serde(default)]
    pub spent_by: Option<String>,
}

impl HistoryEntry {
    pub fn is_unspent(&self) -> bool {
        self.spent_by.is_none()
    }
}

/// Read/write access to the external chain.
#[allow(async_fn_in_trait)]
pub trait ChainOracle {
    /// Every output ever paid to `address`, spent or not.
    async fn get_history(&self, address: &str) -> Result<Vec<HistoryEntry>, OracleError>;

    /// Broadcast a signed raw transaction, returning its id.
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<TxId, OracleError>;
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_hash: String,
}

/// HTTP chain oracle backed by a block-explorer style API.
///
/// Wraps `reqwest::Client` with the explorer's base URL. Every call carries
/// a bounded timeout; a timed-out request surfaces as
/// [`OracleError::Network`] and the sweep can be retried.
#[derive(Clone)]
pub struct HttpOracle {
    http: reqwest::Client,
    base_url: String,
}

impl HttpOracle {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OracleError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl ChainOracle for HttpOracle {
    async fn get_history(&self, address: &str) -> Result<Vec<HistoryEntry>, OracleError> {
        let url = format!("{}/address/{}/history", self.base_url, address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OracleError::Network(format!(
                "history request returned {}",
                response.status()
            )));
        }
        response
            .json::<Vec<HistoryEntry>>()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> Result<TxId, OracleError> {
        let url = format!("{}/tx", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "tx": raw_tx_hex }))
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OracleError::Network(format!(
                "broadcast returned {}",
                response.status()
            )));
        }
        let body = response
            .json::<BroadcastResponse>()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        Ok(TxId::new(body.tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_entry_unspent() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"tx_hash": "ab", "output_index": 0, "value": 100000}"#,
        )
        .unwrap();
        assert!(entry.is_unspent());

        let spent: HistoryEntry = serde_json::from_str(
            r#"{"tx_hash": "ab", "output_index": 1, "value": 5, "spent_by": "cd"}"#,
        )
        .unwrap();
        assert!(!spent.is_unspent());
    }
}
