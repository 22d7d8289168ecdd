//! Sweep-eligibility window.

use relaytip_store::ForwardAddressRecord;
use relaytip_types::Timestamp;

/// Default sweep window: two hours.
pub const DEFAULT_WINDOW_SECS: u64 = 2 * 60 * 60;

/// Decides which ledger entries the batch sweeper still checks.
///
/// One canonical window applies to every call path; the on-demand
/// single-address path passes `check_all` to bypass it. When `expire_stale`
/// is set, entries outside the window are marked permanently ineligible
/// instead of being retried forever.
#[derive(Clone, Copy, Debug)]
pub struct ExpiryPolicy {
    pub window_secs: u64,
    pub expire_stale: bool,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            expire_stale: true,
        }
    }
}

impl ExpiryPolicy {
    pub fn new(window_secs: u64, expire_stale: bool) -> Self {
        Self {
            window_secs,
            expire_stale,
        }
    }

    /// Whether an entry is eligible for sweeping at `now`.
    pub fn eligible(&self, entry: &ForwardAddressRecord, now: Timestamp, check_all: bool) -> bool {
        check_all || !entry.created.has_expired(self.window_secs, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaytip_store::SpendState;
    use relaytip_types::DonationSplit;

    fn entry(created: u64) -> ForwardAddressRecord {
        ForwardAddressRecord {
            id: 1,
            address: "1fwd".into(),
            private_key: "priv".into(),
            public_key: "pub".into(),
            outputs: DonationSplit::new(),
            created: Timestamp::new(created),
            status: SpendState::Unswept,
        }
    }

    #[test]
    fn fresh_entry_is_eligible() {
        let policy = ExpiryPolicy::default();
        let e = entry(10_000);
        assert!(policy.eligible(&e, Timestamp::new(10_000 + 60), false));
    }

    #[test]
    fn entry_past_window_is_not() {
        let policy = ExpiryPolicy::default();
        let e = entry(10_000);
        assert!(!policy.eligible(&e, Timestamp::new(10_000 + DEFAULT_WINDOW_SECS), false));
    }

    #[test]
    fn check_all_overrides_window() {
        let policy = ExpiryPolicy::default();
        let e = entry(0);
        assert!(policy.eligible(&e, Timestamp::new(1_000_000_000), true));
    }

    #[test]
    fn custom_window_applies() {
        let policy = ExpiryPolicy::new(60, false);
        let e = entry(1000);
        assert!(policy.eligible(&e, Timestamp::new(1059), false));
        assert!(!policy.eligible(&e, Timestamp::new(1060), false));
    }
}
