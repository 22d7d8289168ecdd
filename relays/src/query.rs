//! Ranking query options.
//!
//! The external interface is an option bag of string key/value pairs. Each
//! recognized key has an explicit parser and default; malformed values fall
//! back to the default and unrecognized keys are ignored here at the
//! boundary, never inside the core logic.

use serde::Serialize;

/// Which weight column a ranking is sorted by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum SortField {
    #[default]
    ConsensusWeight,
    AdvertisedBandwidth,
    GuardProbability,
    MiddleProbability,
    ExitProbability,
}

impl SortField {
    /// Parse the external field name; `None` for unrecognized names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "cw" => Some(Self::ConsensusWeight),
            "adv_bw" => Some(Self::AdvertisedBandwidth),
            "p_guard" => Some(Self::GuardProbability),
            "p_middle" => Some(Self::MiddleProbability),
            "p_exit" => Some(Self::ExitProbability),
            _ => None,
        }
    }
}

/// An immutable ranking request.
#[derive(Clone, Debug, Serialize)]
pub struct QuerySpec {
    pub by_as: bool,
    pub by_country: bool,
    pub by_network_family: bool,
    pub inactive: bool,
    pub exits_only: bool,
    pub guards_only: bool,
    pub links: bool,
    pub sort: SortField,
    pub sort_reverse: bool,
    /// Number of rows to display; negative means "all".
    pub top: i64,
    pub family: String,
    pub ases: Vec<String>,
    pub country: Vec<String>,
    pub exit_filter: String,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            by_as: false,
            by_country: false,
            by_network_family: false,
            inactive: false,
            exits_only: false,
            guards_only: false,
            links: true,
            sort: SortField::default(),
            sort_reverse: true,
            top: 5,
            family: String::new(),
            ases: Vec::new(),
            country: Vec::new(),
            exit_filter: "all_relays".to_string(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "True" | "TRUE" | "T" => Some(true),
        "false" | "False" | "FALSE" | "F" => Some(false),
        _ => None,
    }
}

/// Lexes a bracketed/comma/whitespace separated list.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || matches!(c, ',' | '[' | ']' | '"' | '\''))
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

impl QuerySpec {
    /// Build a spec from an option bag. Missing keys take their defaults,
    /// malformed values are recovered by substituting the default, and
    /// unknown keys are ignored.
    pub fn from_params<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut spec = Self::default();
        for (key, raw) in params {
            match key {
                "by_as" => spec.by_as = parse_bool(raw).unwrap_or(spec.by_as),
                "by_country" => spec.by_country = parse_bool(raw).unwrap_or(spec.by_country),
                "by_network_family" => {
                    spec.by_network_family = parse_bool(raw).unwrap_or(spec.by_network_family)
                }
                "inactive" => spec.inactive = parse_bool(raw).unwrap_or(spec.inactive),
                "exits_only" => spec.exits_only = parse_bool(raw).unwrap_or(spec.exits_only),
                "guards_only" => spec.guards_only = parse_bool(raw).unwrap_or(spec.guards_only),
                "links" => spec.links = parse_bool(raw).unwrap_or(spec.links),
                "sort" => spec.sort = SortField::parse(raw).unwrap_or_default(),
                "sort_reverse" => {
                    spec.sort_reverse = parse_bool(raw).unwrap_or(spec.sort_reverse)
                }
                "top" => spec.top = raw.parse().unwrap_or(spec.top),
                "family" => spec.family = raw.to_string(),
                "ases" => spec.ases = parse_list(raw),
                "country" => spec.country = parse_json_list(raw),
                "exit_filter" => spec.exit_filter = raw.to_string(),
                other => {
                    tracing::debug!(key = other, "ignoring unrecognized query option");
                }
            }
        }
        spec
    }

    /// Whether any grouping flag is active.
    pub fn grouped(&self) -> bool {
        self.by_country || self.by_as || self.by_network_family
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_interface() {
        let spec = QuerySpec::default();
        assert!(!spec.by_as);
        assert!(!spec.by_country);
        assert!(spec.links);
        assert_eq!(spec.sort, SortField::ConsensusWeight);
        assert!(spec.sort_reverse);
        assert_eq!(spec.top, 5);
        assert_eq!(spec.exit_filter, "all_relays");
        assert!(spec.country.is_empty());
    }

    #[test]
    fn parses_known_keys() {
        let spec = QuerySpec::from_params([
            ("top", "10"),
            ("sort", "p_exit"),
            ("sort_reverse", "false"),
            ("by_country", "true"),
            ("country", r#"["de", "FR"]"#),
            ("ases", "AS1234, AS5678"),
        ]);
        assert_eq!(spec.top, 10);
        assert_eq!(spec.sort, SortField::ExitProbability);
        assert!(!spec.sort_reverse);
        assert!(spec.by_country);
        assert_eq!(spec.country, vec!["de", "FR"]);
        assert_eq!(spec.ases, vec!["AS1234", "AS5678"]);
    }

    #[test]
    fn malformed_values_take_defaults() {
        let spec = QuerySpec::from_params([
            ("top", "lots"),
            ("sort", "nickname"),
            ("by_as", "maybe"),
            ("country", "not json"),
        ]);
        assert_eq!(spec.top, 5);
        assert_eq!(spec.sort, SortField::ConsensusWeight);
        assert!(!spec.by_as);
        assert!(spec.country.is_empty());
    }

    #[test]
    fn unknown_keys_ignored() {
        let spec = QuerySpec::from_params([("frobnicate", "yes"), ("top", "3")]);
        assert_eq!(spec.top, 3);
    }

    #[test]
    fn negative_top_means_all() {
        let spec = QuerySpec::from_params([("top", "-1")]);
        assert_eq!(spec.top, -1);
    }

    #[test]
    fn grouped_reflects_any_flag() {
        assert!(!QuerySpec::default().grouped());
        assert!(QuerySpec::from_params([("by_network_family", "true")]).grouped());
    }
}
