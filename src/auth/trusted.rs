// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted-client assertions and the registry they are matched against.

use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Hardware address in canonical `aa:bb:cc:dd:ee:ff` form.
///
/// Input is lowercased and `-` separators are normalized to `:`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase().replace('-', ":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

/// A MAC entry as clients send it: either a bare string or an interface
/// record `{"Name": "eth0", "Address": "aa:bb:..."}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MacEntry {
    Bare(String),
    Interface {
        #[serde(rename = "Address", alias = "address")]
        address: String,
    },
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let address = match MacEntry::deserialize(deserializer)? {
            MacEntry::Bare(address) | MacEntry::Interface { address } => address,
        };
        Ok(MacAddress::new(&address))
    }
}

/// Decrypted trusted-client payload.
///
/// Only ever constructed from a fully decrypted and parsed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedClientAssertion {
    #[serde(rename = "User", alias = "user")]
    pub user: String,
    #[serde(rename = "IPs", alias = "ips", default)]
    pub ips: BTreeSet<String>,
    #[serde(rename = "MACs", alias = "macs", default)]
    pub macs: BTreeSet<MacAddress>,
}

impl TrustedClientAssertion {
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    fn has_ip(&self, ip: &str) -> bool {
        self.ips.iter().any(|candidate| same_ip(candidate, ip))
    }

    fn has_mac(&self, mac: &MacAddress) -> bool {
        self.macs.contains(mac)
    }
}

/// One allow-listed `(user, ip, mac)` triple from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedClientRegistryEntry {
    pub user: String,
    pub ip: String,
    pub mac: String,
}

/// Read-only allow-list of trusted clients.
#[derive(Debug, Clone, Default)]
pub struct TrustedClientRegistry {
    entries: Vec<TrustedClientRegistryEntry>,
}

impl TrustedClientRegistry {
    pub fn new(entries: Vec<TrustedClientRegistryEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry entries that match the assertion on user, IP and MAC.
    ///
    /// All three fields must hold on the same entry; an IP confirmed by one
    /// entry and a MAC confirmed by another never combine.
    pub fn matching<'a>(
        &'a self,
        assertion: &'a TrustedClientAssertion,
    ) -> impl Iterator<Item = &'a TrustedClientRegistryEntry> + 'a {
        self.entries.iter().filter(move |entry| {
            entry.user == assertion.user
                && assertion.has_ip(&entry.ip)
                && assertion.has_mac(&MacAddress::new(&entry.mac))
        })
    }
}

/// Compare two textual IPs, parsing when possible so `::ffff:10.0.0.5`
/// style spellings do not cause false mismatches.
pub fn same_ip(a: &str, b: &str) -> bool {
    match (a.trim().parse::<IpAddr>(), b.trim().parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => canonical(a) == canonical(b),
        _ => a.trim() == b.trim(),
    }
}

fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

/// Loopback callers bypass the source-address check.
pub fn is_loopback(ip: &str) -> bool {
    ip.trim()
        .parse::<IpAddr>()
        .map(|ip| canonical(ip).is_loopback())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str, ip: &str, mac: &str) -> TrustedClientRegistryEntry {
        TrustedClientRegistryEntry {
            user: user.to_string(),
            ip: ip.to_string(),
            mac: mac.to_string(),
        }
    }

    fn assertion(user: &str, ips: &[&str], macs: &[&str]) -> TrustedClientAssertion {
        TrustedClientAssertion {
            user: user.to_string(),
            ips: ips.iter().map(|s| s.to_string()).collect(),
            macs: macs.iter().map(|s| MacAddress::new(s)).collect(),
        }
    }

    #[test]
    fn parses_go_style_payload() {
        let json = br#"{"User":"carol","IPs":["10.0.0.5"],"MACs":[{"Name":"eth0","Address":"AA-BB-CC-DD-EE-FF"}]}"#;
        let parsed = TrustedClientAssertion::from_json(json).unwrap();
        assert_eq!(parsed.user, "carol");
        assert!(parsed.ips.contains("10.0.0.5"));
        assert!(parsed.macs.contains(&MacAddress::new("aa:bb:cc:dd:ee:ff")));
    }

    #[test]
    fn parses_lowercase_payload_with_bare_macs() {
        let json = br#"{"user":"carol","ips":["10.0.0.5"],"macs":["aa:bb:cc:dd:ee:ff"]}"#;
        let parsed = TrustedClientAssertion::from_json(json).unwrap();
        assert_eq!(parsed.macs.len(), 1);
    }

    #[test]
    fn matches_single_entry() {
        let registry = TrustedClientRegistry::new(vec![entry("carol", "10.0.0.5", "aa:bb:cc:dd:ee:ff")]);
        let asserted = assertion("carol", &["192.168.1.2", "10.0.0.5"], &["aa:bb:cc:dd:ee:ff"]);
        assert_eq!(registry.matching(&asserted).count(), 1);
    }

    #[test]
    fn fields_matching_different_entries_do_not_combine() {
        let registry = TrustedClientRegistry::new(vec![
            entry("carol", "10.0.0.5", "11:11:11:11:11:11"),
            entry("carol", "10.0.0.6", "aa:bb:cc:dd:ee:ff"),
        ]);
        let asserted = assertion("carol", &["10.0.0.5"], &["aa:bb:cc:dd:ee:ff"]);
        assert_eq!(registry.matching(&asserted).count(), 0);
    }

    #[test]
    fn user_must_match() {
        let registry = TrustedClientRegistry::new(vec![entry("dave", "10.0.0.5", "aa:bb:cc:dd:ee:ff")]);
        let asserted = assertion("carol", &["10.0.0.5"], &["aa:bb:cc:dd:ee:ff"]);
        assert_eq!(registry.matching(&asserted).count(), 0);
    }

    #[test]
    fn ip_helpers() {
        assert!(same_ip("10.0.0.5", "::ffff:10.0.0.5"));
        assert!(!same_ip("10.0.0.5", "10.0.0.6"));
        assert!(is_loopback("::1"));
        assert!(is_loopback("127.0.0.1"));
        assert!(!is_loopback("10.0.0.5"));
        assert!(!is_loopback("not-an-ip"));
    }
}
