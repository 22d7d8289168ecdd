//! The per-address sweep state machine.

use crate::error::OracleError;
use crate::fee::{allocate_outputs, calculate_fee, DEFAULT_FEE_PER_KB, MIN_OUTPUT};
use crate::oracle::{ChainOracle, HistoryEntry};
use crate::outcome::Outcome;
use relaytip_crypto::{build_and_sign, TxInput};
use relaytip_ledger::ExpiryPolicy;
use relaytip_store::{ForwardAddressRecord, LedgerStore, StoreError};
use relaytip_types::Timestamp;
use std::sync::Arc;

/// Tunables for the sweeper.
#[derive(Clone, Copy, Debug)]
pub struct SweepConfig {
    pub fee_per_kb: u64,
    pub min_output: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            fee_per_kb: DEFAULT_FEE_PER_KB,
            min_output: MIN_OUTPUT,
        }
    }
}

/// Outcome of one address within a batch run.
#[derive(Debug)]
pub struct SweepReport {
    pub address: String,
    pub outcome: Outcome,
}

/// Sweeps forwarding addresses: checks the chain for funds, builds the
/// split transaction and settles the ledger entry.
///
/// A ledger entry moves `Unswept -> Spent` exactly once. The precheck on
/// `is_spent` is only a fast path; the real guarantee is the store's
/// `seal`, which rejects a second settlement with a conflict after the
/// first one committed.
pub struct PaymentSweeper<O: ChainOracle> {
    oracle: O,
    store: Arc<dyn LedgerStore>,
    config: SweepConfig,
}

impl<O: ChainOracle> PaymentSweeper<O> {
    pub fn new(oracle: O, store: Arc<dyn LedgerStore>, config: SweepConfig) -> Self {
        Self {
            oracle,
            store,
            config,
        }
    }

    /// Sweep the entry recorded for `address`, if any.
    pub async fn sweep_address(&self, address: &str) -> Outcome {
        match self.store.get(address) {
            Ok(entry) => self.sweep(&entry).await,
            Err(StoreError::NotFound(_)) => {
                Outcome::fail(404, "could not find the keys for this address")
            }
            Err(e) => Outcome::error(e.to_string()),
        }
    }

    /// Attempt to forward the funds accumulated at `entry.address`.
    pub async fn sweep(&self, entry: &ForwardAddressRecord) -> Outcome {
        if entry.is_spent() {
            return Outcome::fail(404, "already forwarded");
        }

        let history = match self.oracle.get_history(&entry.address).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(address = %entry.address, error = %e, "history fetch failed");
                return Outcome::error(e.to_string());
            }
        };
        if history.is_empty() {
            return Outcome::fail(404, "no funds received yet");
        }
        let unspent: Vec<&HistoryEntry> = history.iter().filter(|h| h.is_unspent()).collect();
        if unspent.is_empty() {
            return Outcome::fail(404, "already forwarded");
        }

        let fee = calculate_fee(unspent.len(), entry.outputs.len(), self.config.fee_per_kb);
        let unspent_value: u64 = unspent.iter().map(|h| h.value).sum();
        if unspent_value <= fee {
            return Outcome::fail(
                500,
                format!("balance of {unspent_value} satoshis does not cover the {fee} satoshi fee"),
            );
        }
        let spendable = unspent_value - fee;

        let outputs = allocate_outputs(&entry.outputs, spendable, self.config.min_output);
        if outputs.is_empty() {
            return Outcome::fail(500, "no eligible forwarding addresses");
        }
        let amount: u64 = outputs.iter().map(|o| o.value).sum();

        let inputs: Vec<TxInput> = unspent
            .iter()
            .map(|h| TxInput {
                prev_txid: h.tx_hash.clone(),
                prev_index: h.output_index,
            })
            .collect();
        let signed = match build_and_sign(&inputs, &outputs, &entry.address, &entry.private_key) {
            Ok(signed) => signed,
            Err(e) => return Outcome::error(format!("transaction build failed: {e}")),
        };

        // Nothing in the ledger is touched until the broadcast succeeds; a
        // failure here leaves the entry unswept and retryable.
        let tx_hash = match self.oracle.broadcast(&signed.raw_hex).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                tracing::warn!(address = %entry.address, error = %e, "broadcast failed");
                return Outcome::error(e.to_string());
            }
        };

        match self.store.seal(&entry.address, tx_hash.as_str(), amount) {
            Ok(_) => {
                tracing::info!(
                    address = %entry.address,
                    tx_hash = %tx_hash,
                    amount,
                    inputs = inputs.len(),
                    outputs = outputs.len(),
                    "swept forwarding address"
                );
                Outcome::Success { tx_hash, amount }
            }
            // A concurrent sweep settled first; its transaction spent the
            // funds, so this attempt forwarded nothing.
            Err(StoreError::Conflict(_)) => Outcome::fail(404, "already forwarded"),
            Err(e) => Outcome::error(e.to_string()),
        }
    }

    /// Sweep every unswept entry still inside the policy window.
    ///
    /// Entries outside the window are marked expired when the policy says
    /// so; `check_all` overrides the window and sweeps everything.
    pub async fn sweep_eligible(
        &self,
        policy: &ExpiryPolicy,
        now: Timestamp,
        check_all: bool,
    ) -> Result<Vec<SweepReport>, StoreError> {
        let mut reports = Vec::new();
        for entry in self.store.unswept()? {
            if policy.eligible(&entry, now, check_all) {
                let outcome = self.sweep(&entry).await;
                reports.push(SweepReport {
                    address: entry.address,
                    outcome,
                });
            } else if policy.expire_stale {
                self.store.mark_expired(&entry.address)?;
                tracing::info!(address = %entry.address, "expired stale forwarding address");
            }
        }
        Ok(reports)
    }
}
