//! Weight aggregation — grouping relays and summing their weight fractions.

use crate::query::QuerySpec;
use crate::rank::RankedResult;
use crate::record::RelayRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Grouping key: the enabled grouping components, or the fingerprint when no
/// grouping flag is set (one group per relay).
fn group_key(relay: &RelayRecord, spec: &QuerySpec) -> Vec<String> {
    let mut key = Vec::new();
    if spec.by_country {
        key.push(relay.country_lower());
    }
    if spec.by_as {
        key.push(relay.as_number.clone().unwrap_or_else(|| "??".into()));
    }
    if spec.by_network_family {
        key.push(relay.network_family());
    }
    if key.is_empty() {
        key.push(relay.fingerprint.clone());
    }
    key
}

/// Group the filtered relays and produce one aggregate row per group.
///
/// Each row carries the five summed weight percentages plus the display
/// metadata: a single relay's identity for ungrouped queries, count
/// placeholders for grouped ones.
pub fn group_and_weigh(relays: &[&RelayRecord], spec: &QuerySpec) -> Vec<RankedResult> {
    let mut groups: BTreeMap<Vec<String>, Vec<&RelayRecord>> = BTreeMap::new();
    for relay in relays {
        groups.entry(group_key(relay, spec)).or_default().push(relay);
    }

    let mut rows = Vec::with_capacity(groups.len());
    for members in groups.values() {
        let mut row = RankedResult {
            link: spec.links,
            ..Default::default()
        };

        let mut exits = 0usize;
        let mut guards = 0usize;
        let mut ases = BTreeSet::new();
        let mut countries = BTreeSet::new();
        let mut families = BTreeSet::new();

        for relay in members {
            row.cw += relay.consensus_weight_fraction;
            row.adv_bw += relay.advertised_bandwidth_fraction;
            row.p_guard += relay.guard_probability;
            row.p_middle += relay.middle_probability;
            row.p_exit += relay.exit_probability;

            row.nick = relay.nickname.clone();
            row.fp = relay.fingerprint.clone();
            if relay.has_exit_flag() {
                row.exit = "yes".into();
                exits += 1;
            }
            if relay.has_guard_flag() {
                row.guard = "yes".into();
                guards += 1;
            }
            row.cc = relay.country_lower();
            countries.insert(row.cc.clone());
            row.primary_ip = relay.primary_ip();
            families.insert(relay.network_family());
            row.as_info = relay.as_info();
            ases.insert(row.as_info.clone());
            row.bitcoin_address = relay
                .bitcoin_address
                .clone()
                .unwrap_or_default();
        }

        // Fractions → percentages.
        row.cw *= 100.0;
        row.adv_bw *= 100.0;
        row.p_guard *= 100.0;
        row.p_middle *= 100.0;
        row.p_exit *= 100.0;

        if spec.grouped() {
            row.nick = "*".into();
            row.fp = format!("({} relays)", members.len());
            row.exit = format!("({exits})");
            row.guard = format!("({guards})");
            if !spec.by_as && spec.ases.is_empty() {
                row.as_info = format!("({})", ases.len());
            }
            if !spec.by_country && spec.country.is_empty() {
                row.cc = format!("({})", countries.len());
            }
            if spec.by_network_family {
                row.primary_ip = families
                    .iter()
                    .next()
                    .cloned()
                    .unwrap_or_default();
            } else {
                row.primary_ip = format!("({} diff. /16)", families.len());
            }
        }

        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(fp: &str, country: &str, asn: &str, cw: f64) -> RelayRecord {
        RelayRecord {
            fingerprint: fp.into(),
            nickname: format!("nick-{fp}"),
            country: Some(country.into()),
            as_number: Some(asn.into()),
            as_name: Some("ExampleNet".into()),
            or_addresses: vec!["203.0.113.9:9001".into()],
            consensus_weight_fraction: cw,
            advertised_bandwidth_fraction: cw / 2.0,
            guard_probability: cw / 4.0,
            middle_probability: cw / 4.0,
            exit_probability: cw / 4.0,
            flags: vec!["Exit".into(), "Guard".into()],
            bitcoin_address: Some("1abc".into()),
            ..Default::default()
        }
    }

    #[test]
    fn no_grouping_one_row_per_relay() {
        let a = relay("A", "de", "AS1", 0.1);
        let b = relay("B", "de", "AS1", 0.2);
        let refs = vec![&a, &b];
        let rows = group_and_weigh(&refs, &QuerySpec::default());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.fp == "A"));
    }

    #[test]
    fn weights_become_percentages() {
        let a = relay("A", "de", "AS1", 0.25);
        let refs = vec![&a];
        let rows = group_and_weigh(&refs, &QuerySpec::default());
        assert!((rows[0].cw - 25.0).abs() < 1e-9);
    }

    #[test]
    fn country_grouping_merges_and_counts() {
        let a = relay("A", "de", "AS1", 0.1);
        let b = relay("B", "DE", "AS2", 0.2);
        let c = relay("C", "fr", "AS1", 0.3);
        let refs = vec![&a, &b, &c];
        let spec = QuerySpec {
            by_country: true,
            ..Default::default()
        };
        let rows = group_and_weigh(&refs, &spec);
        assert_eq!(rows.len(), 2);

        let de = rows.iter().find(|r| r.fp == "(2 relays)").unwrap();
        assert!((de.cw - 30.0).abs() < 1e-9);
        assert_eq!(de.nick, "*");
        assert_eq!(de.exit, "(2)");
        assert_eq!(de.as_info, "(2)");
        // Grouped by country, so the country column keeps its value.
        assert_eq!(de.cc, "de");
    }

    #[test]
    fn grouped_rows_show_distinct_family_count() {
        let mut a = relay("A", "de", "AS1", 0.1);
        a.or_addresses = vec!["198.51.100.1:443".into()];
        let b = relay("B", "de", "AS1", 0.2);
        let refs = vec![&a, &b];
        let spec = QuerySpec {
            by_country: true,
            ..Default::default()
        };
        let rows = group_and_weigh(&refs, &spec);
        assert_eq!(rows[0].primary_ip, "(2 diff. /16)");
    }
}
