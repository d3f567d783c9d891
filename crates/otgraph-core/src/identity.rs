//! # Identity Module
//!
//! Normalization of identity hints and the resolver's identity indices.
//!
//! - MAC addresses compare case- and separator-insensitively
//! - Hostnames and sysNames compare case-insensitively
//! - IP addresses compare as raw strings
//!
//! Index entries always point at a device the resolver owns. They are
//! overwritten when an identity moves, never removed.

use crate::{CandidateObservation, CorrelationKey, DeviceId, NetworkInterface};
use std::collections::BTreeMap;

/// Normalize a MAC address.
///
/// Separators (`:`, `-`, `.`) and whitespace are dropped and hex digits
/// lowercased. Twelve hex digits render as `aa:bb:cc:dd:ee:ff`; anything
/// else is kept in its stripped form so it still compares consistently.
#[must_use]
pub fn normalize_mac(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.') && !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if stripped.is_empty() {
        return None;
    }

    if stripped.len() == 12 && stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        let octets: Vec<&str> = (0..6).map(|i| &stripped[i * 2..i * 2 + 2]).collect();
        return Some(octets.join(":"));
    }

    Some(stripped)
}

/// Normalize a hostname or sysName for comparison.
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Identity signals on which two candidates agree, in key order.
///
/// Empty when the candidates share nothing.
#[must_use]
pub fn match_keys(a: &CandidateObservation, b: &CandidateObservation) -> Vec<CorrelationKey> {
    let mut keys = Vec::new();

    let mac_a = a.mac().and_then(normalize_mac);
    if mac_a.is_some() && mac_a == b.mac().and_then(normalize_mac) {
        keys.push(CorrelationKey::Mac);
    }

    if let (Some(ip_a), Some(ip_b)) = (a.ip(), b.ip()) {
        if ip_a == ip_b {
            keys.push(CorrelationKey::Ip);
        }
    }

    let host_a = a.host().and_then(normalize_name);
    if host_a.is_some() && host_a == b.host().and_then(normalize_name) {
        keys.push(CorrelationKey::Hostname);
    }

    let sys_a = a.sys().and_then(normalize_name);
    if sys_a.is_some() && sys_a == b.sys().and_then(normalize_name) {
        keys.push(CorrelationKey::SysName);
    }

    keys
}

/// Whether two candidates describe the same device (any signal suffices).
#[must_use]
pub fn candidates_match(a: &CandidateObservation, b: &CandidateObservation) -> bool {
    !match_keys(a, b).is_empty()
}

/// Dedup key for an interface: normalized MAC, else name + IP.
fn interface_key(iface: &NetworkInterface) -> String {
    match iface.mac_address.as_deref().and_then(normalize_mac) {
        Some(mac) => mac,
        None => format!(
            "{}@{}",
            iface.name.to_lowercase(),
            iface.ip_address.as_deref().unwrap_or_default()
        ),
    }
}

/// Union `incoming` into `existing`, deduplicating by normalized MAC.
///
/// The first interface seen for a key wins; later duplicates only fill
/// fields the winner leaves empty.
pub fn merge_interfaces<I>(existing: &mut Vec<NetworkInterface>, incoming: I)
where
    I: IntoIterator<Item = NetworkInterface>,
{
    for iface in incoming {
        let key = interface_key(&iface);
        match existing.iter_mut().find(|e| interface_key(e) == key) {
            Some(current) => {
                if current.ip_address.is_none() {
                    current.ip_address = iface.ip_address;
                }
                if current.netmask.is_none() {
                    current.netmask = iface.netmask;
                }
                if current.vlan.is_none() {
                    current.vlan = iface.vlan;
                }
                if current.speed.is_none() {
                    current.speed = iface.speed;
                }
            }
            None => existing.push(iface),
        }
    }
}

// =============================================================================
// IDENTITY INDEX
// =============================================================================

/// Normalized MAC / IP / hostname → device id.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    by_mac: BTreeMap<String, DeviceId>,
    by_ip: BTreeMap<String, DeviceId>,
    by_hostname: BTreeMap<String, DeviceId>,
}

impl IdentityIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a candidate up: MAC first, then IP, then hostname.
    #[must_use]
    pub fn lookup(&self, candidate: &CandidateObservation) -> Option<(DeviceId, CorrelationKey)> {
        if let Some(id) = candidate.mac().and_then(|m| self.lookup_mac(m)) {
            return Some((id, CorrelationKey::Mac));
        }
        if let Some(id) = candidate.ip().and_then(|ip| self.lookup_ip(ip)) {
            return Some((id, CorrelationKey::Ip));
        }
        if let Some(id) = candidate.host().and_then(|h| self.lookup_hostname(h)) {
            return Some((id, CorrelationKey::Hostname));
        }
        None
    }

    pub fn lookup_mac(&self, mac: &str) -> Option<DeviceId> {
        normalize_mac(mac).and_then(|m| self.by_mac.get(&m).copied())
    }

    pub fn lookup_ip(&self, ip: &str) -> Option<DeviceId> {
        self.by_ip.get(ip.trim()).copied()
    }

    pub fn lookup_hostname(&self, hostname: &str) -> Option<DeviceId> {
        normalize_name(hostname).and_then(|h| self.by_hostname.get(&h).copied())
    }

    /// Point every identity hint of `candidate` at `device`.
    pub fn record(&mut self, candidate: &CandidateObservation, device: DeviceId) {
        if let Some(mac) = candidate.mac().and_then(normalize_mac) {
            self.by_mac.insert(mac, device);
        }
        if let Some(ip) = candidate.ip() {
            self.by_ip.insert(ip.to_string(), device);
        }
        if let Some(host) = candidate.host().and_then(normalize_name) {
            self.by_hostname.insert(host, device);
        }
    }

    /// Number of entries across all three indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_mac.len() + self.by_ip.len() + self.by_hostname.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All device ids referenced by any entry.
    pub fn referenced_devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.by_mac
            .values()
            .chain(self.by_ip.values())
            .chain(self.by_hostname.values())
            .copied()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn mac_normalization_ignores_case_and_separators() {
        let expected = Some("aa:bb:cc:dd:ee:ff".to_string());
        assert_eq!(normalize_mac("AA:BB:CC:DD:EE:FF"), expected);
        assert_eq!(normalize_mac("aa-bb-cc-dd-ee-ff"), expected);
        assert_eq!(normalize_mac("aabb.ccdd.eeff"), expected);
        assert_eq!(normalize_mac(" aabbccddeeff "), expected);
    }

    #[test]
    fn malformed_mac_kept_in_stripped_form() {
        assert_eq!(normalize_mac("00:1B:2C"), Some("001b2c".to_string()));
        assert_eq!(normalize_mac("::"), None);
    }

    #[test]
    fn names_compare_case_insensitively() {
        assert_eq!(normalize_name(" PLC-01 "), Some("plc-01".to_string()));
        assert_eq!(normalize_name(""), None);
    }

    #[test]
    fn match_on_any_single_signal() {
        let base = CandidateObservation::new("snmp", 80).with_hostname("PLC-01");
        let by_host = CandidateObservation::new("syslog", 40).with_hostname("plc-01");
        assert_eq!(match_keys(&base, &by_host), vec![CorrelationKey::Hostname]);

        let a = CandidateObservation::new("snmp", 80).with_sys_name("Line3-PLC");
        let b = CandidateObservation::new("snmp", 80).with_sys_name("line3-plc");
        assert!(candidates_match(&a, &b));

        let c = CandidateObservation::new("arp", 60).with_ip("10.0.1.5");
        let d = CandidateObservation::new("netflow", 30).with_ip("10.0.1.6");
        assert!(!candidates_match(&c, &d));
    }

    #[test]
    fn match_reports_every_agreeing_signal() {
        let a = CandidateObservation::new("snmp", 80)
            .with_mac("aa:bb:cc:dd:ee:ff")
            .with_ip("10.0.1.5");
        let b = CandidateObservation::new("arp", 60)
            .with_mac("AA-BB-CC-DD-EE-FF")
            .with_ip("10.0.1.5");
        assert_eq!(
            match_keys(&a, &b),
            vec![CorrelationKey::Mac, CorrelationKey::Ip]
        );
    }

    #[test]
    fn absent_fields_never_match() {
        let a = CandidateObservation::new("snmp", 80);
        let b = CandidateObservation::new("arp", 60);
        assert!(!candidates_match(&a, &b));
    }

    #[test]
    fn merge_interfaces_dedups_by_mac() {
        let mut existing = vec![NetworkInterface::new("eth0").with_mac("aa:bb:cc:dd:ee:ff")];
        merge_interfaces(
            &mut existing,
            vec![
                NetworkInterface::new("port1")
                    .with_mac("AA:BB:CC:DD:EE:FF")
                    .with_ip("10.0.1.5"),
                NetworkInterface::new("eth1").with_mac("11:22:33:44:55:66"),
            ],
        );

        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].name, "eth0");
        assert_eq!(existing[0].ip_address.as_deref(), Some("10.0.1.5"));
        assert_eq!(existing[1].name, "eth1");
    }

    #[test]
    fn merge_interfaces_without_mac_uses_name_and_ip() {
        let mut existing = vec![NetworkInterface::new("serial0")];
        merge_interfaces(
            &mut existing,
            vec![
                NetworkInterface::new("SERIAL0"),
                NetworkInterface::new("eth0").with_ip("10.0.0.9"),
            ],
        );
        assert_eq!(existing.len(), 2);
    }

    #[test]
    fn index_lookup_order_is_mac_ip_hostname() {
        let mac_device = DeviceId(Uuid::from_u128(1));
        let ip_device = DeviceId(Uuid::from_u128(2));

        let mut index = IdentityIndex::new();
        index.record(
            &CandidateObservation::new("arp", 60).with_mac("aa:bb:cc:dd:ee:ff"),
            mac_device,
        );
        index.record(
            &CandidateObservation::new("arp", 60).with_ip("10.0.1.5"),
            ip_device,
        );

        let probe = CandidateObservation::new("snmp", 80)
            .with_ip("10.0.1.5")
            .with_mac("AABBCCDDEEFF");
        assert_eq!(
            index.lookup(&probe),
            Some((mac_device, CorrelationKey::Mac))
        );

        let ip_only = CandidateObservation::new("snmp", 80).with_ip("10.0.1.5");
        assert_eq!(index.lookup(&ip_only), Some((ip_device, CorrelationKey::Ip)));
    }

    #[test]
    fn index_entries_are_overwritten() {
        let first = DeviceId(Uuid::from_u128(1));
        let second = DeviceId(Uuid::from_u128(2));
        let candidate = CandidateObservation::new("snmp", 80).with_hostname("HMI-2");

        let mut index = IdentityIndex::new();
        index.record(&candidate, first);
        index.record(&candidate, second);

        assert_eq!(index.lookup_hostname("hmi-2"), Some(second));
        assert_eq!(index.len(), 1);
    }
}
