//! A single relay as described by the input dataset.

use serde::Deserialize;

/// One relay record from the details document. Read-only input data.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RelayRecord {
    pub fingerprint: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub as_number: Option<String>,
    #[serde(default)]
    pub as_name: Option<String>,
    #[serde(default)]
    pub or_addresses: Vec<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub consensus_weight_fraction: f64,
    #[serde(default)]
    pub advertised_bandwidth_fraction: f64,
    #[serde(default)]
    pub guard_probability: f64,
    #[serde(default)]
    pub middle_probability: f64,
    #[serde(default)]
    pub exit_probability: f64,
    /// Donation address, either present in the document or annotated from
    /// the contact field by `Dataset::annotate`.
    #[serde(default)]
    pub bitcoin_address: Option<String>,
}

impl RelayRecord {
    /// Whether the relay carries the Exit flag without being a BadExit.
    pub fn has_exit_flag(&self) -> bool {
        self.flags.iter().any(|f| f == "Exit") && !self.flags.iter().any(|f| f == "BadExit")
    }

    pub fn has_guard_flag(&self) -> bool {
        self.flags.iter().any(|f| f == "Guard")
    }

    /// Lowercased country code, `"??"` when unknown.
    pub fn country_lower(&self) -> String {
        self.country
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| "??".to_string())
    }

    /// First listed OR address without its port.
    pub fn primary_ip(&self) -> String {
        let first = self
            .or_addresses
            .first()
            .map(String::as_str)
            .unwrap_or("??:0");
        if let Some(rest) = first.strip_prefix('[') {
            // Bracketed IPv6 literal.
            rest.split(']').next().unwrap_or("??").to_string()
        } else {
            first.split(':').next().unwrap_or("??").to_string()
        }
    }

    /// `"AS-number AS-name"` display string.
    pub fn as_info(&self) -> String {
        format!(
            "{} {}",
            self.as_number.as_deref().unwrap_or("??"),
            self.as_name.as_deref().unwrap_or("??")
        )
    }

    /// Network family identifier: the /16 of the primary IPv4 address, or
    /// the raw primary address for relays without one.
    pub fn network_family(&self) -> String {
        let ip = self.primary_ip();
        let octets: Vec<&str> = ip.split('.').collect();
        if octets.len() == 4 {
            format!("{}.{}.0.0/16", octets[0], octets[1])
        } else {
            ip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_flag_requires_not_bad_exit() {
        let mut relay = RelayRecord {
            flags: vec!["Exit".into(), "Running".into()],
            ..Default::default()
        };
        assert!(relay.has_exit_flag());
        relay.flags.push("BadExit".into());
        assert!(!relay.has_exit_flag());
    }

    #[test]
    fn primary_ip_strips_port() {
        let relay = RelayRecord {
            or_addresses: vec!["203.0.113.9:9001".into()],
            ..Default::default()
        };
        assert_eq!(relay.primary_ip(), "203.0.113.9");
    }

    #[test]
    fn primary_ip_handles_ipv6() {
        let relay = RelayRecord {
            or_addresses: vec!["[2001:db8::1]:443".into()],
            ..Default::default()
        };
        assert_eq!(relay.primary_ip(), "2001:db8::1");
    }

    #[test]
    fn network_family_is_slash_16() {
        let relay = RelayRecord {
            or_addresses: vec!["203.0.113.9:9001".into()],
            ..Default::default()
        };
        assert_eq!(relay.network_family(), "203.0.0.0/16");
    }

    #[test]
    fn unknown_fields_default() {
        let relay = RelayRecord::default();
        assert_eq!(relay.country_lower(), "??");
        assert_eq!(relay.primary_ip(), "??");
        assert_eq!(relay.as_info(), "?? ??");
    }
}
