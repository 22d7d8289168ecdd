//! The persisted forwarding-address record.

use relaytip_types::{DonationSplit, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle of a forwarding address.
///
/// `Unswept` is the initial state; `Spent` is terminal and reached exactly
/// once, carrying the spending transaction and the donated amount. `Expired`
/// marks stale addresses the batch sweeper no longer retries. The state tag
/// (rather than a spent bool plus nullable columns) makes "already spent" a
/// checkable precondition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SpendState {
    Unswept,
    Expired,
    Spent {
        spending_tx: String,
        donation_amount: u64,
    },
}

/// One ledger entry: a deterministic one-time key pair bound to an immutable
/// payout split.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForwardAddressRecord {
    /// Monotonically increasing id; doubles as the derivation index.
    pub id: u64,
    /// The one-time receiving address (globally unique).
    pub address: String,
    /// Hex secp256k1 secret scalar (unique).
    pub private_key: String,
    /// Hex compressed public key (unique).
    pub public_key: String,
    /// Payout split captured at creation; immutable thereafter.
    pub outputs: DonationSplit,
    /// Creation time (UTC).
    pub created: Timestamp,
    #[serde(flatten)]
    pub status: SpendState,
}

impl ForwardAddressRecord {
    pub fn is_unswept(&self) -> bool {
        self.status == SpendState::Unswept
    }

    pub fn is_spent(&self) -> bool {
        matches!(self.status, SpendState::Spent { .. })
    }
}
