//! Ledger error types.

use relaytip_crypto::KeyError;
use relaytip_store::StoreError;
use relaytip_types::SplitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid donation split: {0}")]
    InvalidSplit(#[from] SplitError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
