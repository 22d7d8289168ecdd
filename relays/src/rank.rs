//! Ranking — sorting, top-N truncation, summary rows, donation shares.

use crate::aggregate::group_and_weigh;
use crate::dataset::Dataset;
use crate::filter::{apply, chain_for};
use crate::query::{QuerySpec, SortField};
use relaytip_types::DonationSplit;
use serde::Serialize;
use std::cmp::Ordering;

/// One row of a ranking: a single relay's or a group's aggregate.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RankedResult {
    /// 1-based rank, assigned only to displayed rows.
    pub index: Option<u32>,
    /// Percentage of a donation allocated to this row; meaningful only on
    /// displayed rows.
    pub donation_share: f64,
    pub cw: f64,
    pub adv_bw: f64,
    pub p_guard: f64,
    pub p_middle: f64,
    pub p_exit: f64,
    pub nick: String,
    pub fp: String,
    pub link: bool,
    pub exit: String,
    pub guard: String,
    pub cc: String,
    pub primary_ip: String,
    pub as_info: String,
    pub bitcoin_address: String,
}

impl RankedResult {
    fn accumulate(&mut self, row: &RankedResult) {
        self.cw += row.cw;
        self.adv_bw += row.adv_bw;
        self.p_guard += row.p_guard;
        self.p_middle += row.p_middle;
        self.p_exit += row.p_exit;
    }
}

fn sort_value(row: &RankedResult, field: SortField) -> f64 {
    match field {
        SortField::ConsensusWeight => row.cw,
        SortField::AdvertisedBandwidth => row.adv_bw,
        SortField::GuardProbability => row.p_guard,
        SortField::MiddleProbability => row.p_middle,
        SortField::ExitProbability => row.p_exit,
    }
}

/// A completed ranking.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RankedSet {
    /// The displayed rows, ranked 1..=top.
    pub results: Vec<RankedResult>,
    /// Aggregate over the rows cut off by `top`; present only when at least
    /// one row was excluded.
    pub excluded: Option<RankedResult>,
    /// Aggregate over every row; omitted when the selection already covers
    /// essentially the whole network (total cw > 99.9%).
    pub total: Option<RankedResult>,
    pub relays_published: String,
}

/// Omit the total row above this consensus-weight percentage.
const TOTAL_ROW_CUTOFF: f64 = 99.9;

/// Sort, truncate to top-N, derive the excluded/total summary rows, and
/// compute proportional donation shares.
pub fn rank(mut rows: Vec<RankedResult>, spec: &QuerySpec) -> RankedSet {
    // Stable sort: rows with equal keys keep their input order.
    rows.sort_by(|a, b| {
        let (x, y) = (sort_value(a, spec.sort), sort_value(b, spec.sort));
        let ordering = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        if spec.sort_reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });

    let row_count = rows.len();
    let top = if spec.top < 0 {
        row_count
    } else {
        spec.top as usize
    };

    let kind = if spec.grouped() { "relay groups" } else { "relays" };
    let mut excluded = RankedResult {
        nick: format!("({} other {kind})", row_count.saturating_sub(top)),
        ..Default::default()
    };
    let mut total = RankedResult {
        nick: "(total in selection)".to_string(),
        ..Default::default()
    };

    let mut displayed = Vec::with_capacity(top.min(row_count));
    let mut displayed_cw = 0.0;
    for (i, mut row) in rows.into_iter().enumerate() {
        // Group rows have no single relay to link to.
        if spec.grouped() {
            row.link = false;
        }
        total.accumulate(&row);
        if i < top {
            row.index = Some(i as u32 + 1);
            displayed_cw += row.cw;
            displayed.push(row);
        } else {
            excluded.accumulate(&row);
        }
    }

    // Guard against the empty/zero-weight selection: donation shares are
    // defined as zero rather than dividing by zero.
    if displayed_cw > 0.0 {
        for row in &mut displayed {
            row.donation_share = row.cw / displayed_cw * 100.0;
        }
        total.donation_share = displayed.iter().map(|r| r.donation_share).sum();
    }

    RankedSet {
        results: displayed,
        excluded: (row_count > top).then_some(excluded),
        total: (total.cw <= TOTAL_ROW_CUTOFF).then_some(total),
        relays_published: String::new(),
    }
}

/// Run the full pipeline over a dataset: filter, aggregate, rank.
pub fn determine_relays(dataset: &Dataset, spec: &QuerySpec) -> RankedSet {
    let filters = chain_for(spec);
    let selected = apply(&filters, &dataset.relays);
    let rows = group_and_weigh(&selected, spec);
    let mut set = rank(rows, spec);
    set.relays_published = dataset.relays_published.clone();
    set
}

/// Condense the displayed rows into an address → percentage donation split.
/// Shares of rows paying the same address are summed.
pub fn donation_split(set: &RankedSet) -> DonationSplit {
    set.results
        .iter()
        .filter(|row| !row.bitcoin_address.is_empty())
        .map(|row| (row.bitcoin_address.clone(), row.donation_share))
        .collect()
}
