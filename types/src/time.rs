//! Creation timestamps for ledger entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// When a forwarding address was created, in Unix seconds (UTC).
///
/// The only arithmetic the ledger needs is the sweep-window check, so that
/// is the whole API: construct, read, and ask whether a window has closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// The current wall clock. A clock before the epoch reads as zero.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whether `window_secs` have fully passed between this timestamp and
    /// `now`. The boundary second counts as expired; a `now` before the
    /// timestamp does not.
    pub fn has_expired(&self, window_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(window_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
