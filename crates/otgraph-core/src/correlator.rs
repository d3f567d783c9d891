//! # Correlator
//!
//! Entity resolution for candidate observations.
//!
//! One `correlate` call runs four steps per batch:
//! 1. **Cluster**: each unclustered candidate seeds a cluster; later
//!    candidates join it when they match the seed itself (not transitively).
//! 2. **Order**: cluster members sort by configured source priority, then by
//!    newest observation. This order decides every attribute conflict.
//! 3. **Resolve**: the first identity-index hit along that order names the
//!    existing device, if any.
//! 4. **Merge**: first non-empty value per scalar field; interfaces and
//!    sources unioned; metadata shallow-merged in order, minus the keys the
//!    correlator itself writes.
//!
//! The correlator owns its devices and identity indices. It performs no I/O
//! and never fails: missing identity fields only lower name quality and
//! confidence.

use crate::classification;
use crate::confidence::{self, ConfidenceScore};
use crate::identity::{self, IdentityIndex};
use crate::primitives::{
    DEVICE_ID_NAMESPACE, META_CORRELATION_CONFIDENCE, META_SOURCES, META_SYS_NAME,
    PRIMARY_INTERFACE_NAME, RESERVED_METADATA_KEYS, UNKNOWN_DEVICE_NAME,
};
use crate::{
    CandidateObservation, CorrelationKey, CorrelatorConfig, Device, DeviceId, DeviceStatus,
    DeviceType, MetaValue, Metadata, NetworkInterface, OtGraphError, PurdueLevel, SecurityZone,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Outcome of resolving one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// The device after create-or-update.
    pub device: Device,
    /// Distinct source tags of the cluster, in priority order.
    pub sources: Vec<String>,
    /// Correlation confidence, 0-100.
    pub confidence: u8,
    /// Identity key kinds that linked this result.
    pub correlated_by: Vec<CorrelationKey>,
    /// Whether the device was created by this call.
    pub created: bool,
}

/// Candidates that matched one seed, plus the signals they matched on.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    pub members: Vec<&'a CandidateObservation>,
    pub keys: BTreeSet<CorrelationKey>,
}

/// Attribute values merged from one sorted cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedObservation {
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub hostname: Option<String>,
    pub sys_name: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub device_type: Option<DeviceType>,
    pub interfaces: Vec<NetworkInterface>,
    pub metadata: Metadata,
    pub sources: Vec<String>,
    /// Highest candidate confidence, before freshness decay.
    pub confidence: u8,
}

// =============================================================================
// PURE STEPS
// =============================================================================

/// Split a batch into clusters using seed-only matching.
#[must_use]
pub fn cluster_candidates(batch: &[CandidateObservation]) -> Vec<Cluster<'_>> {
    let mut clustered = vec![false; batch.len()];
    let mut clusters = Vec::new();

    for (i, seed) in batch.iter().enumerate() {
        if clustered[i] {
            continue;
        }
        clustered[i] = true;

        let mut members = vec![seed];
        let mut keys = BTreeSet::new();
        for (j, other) in batch.iter().enumerate().skip(i + 1) {
            if clustered[j] {
                continue;
            }
            let matched = identity::match_keys(seed, other);
            if !matched.is_empty() {
                clustered[j] = true;
                members.push(other);
                keys.extend(matched);
            }
        }

        clusters.push(Cluster { members, keys });
    }

    clusters
}

/// Sort by source priority, then newest first; missing timestamps sort oldest.
///
/// The sort is stable, so full ties keep batch order.
pub fn sort_by_priority(members: &mut [&CandidateObservation], config: &CorrelatorConfig) {
    members.sort_by_key(|c| (config.priority_rank(&c.source), Reverse(c.observed_at)));
}

fn first_non_empty<'a, F>(members: &[&'a CandidateObservation], field: F) -> Option<String>
where
    F: Fn(&'a CandidateObservation) -> Option<&'a str>,
{
    members.iter().find_map(|c| field(c)).map(str::to_string)
}

/// Merge a sorted cluster into one set of attribute values.
#[must_use]
pub fn merge_candidates(sorted: &[&CandidateObservation]) -> MergedObservation {
    let mut interfaces = Vec::new();
    let mut metadata = Metadata::new();
    let mut sources: Vec<String> = Vec::new();

    for candidate in sorted {
        identity::merge_interfaces(&mut interfaces, candidate.interfaces.iter().cloned());
        metadata.extend(
            candidate
                .metadata
                .iter()
                .filter(|(k, _)| !RESERVED_METADATA_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let source = candidate.source.trim();
        if !source.is_empty() && !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }

    MergedObservation {
        ip_address: first_non_empty(sorted, CandidateObservation::ip),
        mac_address: first_non_empty(sorted, CandidateObservation::mac)
            .map(|m| identity::normalize_mac(&m).unwrap_or(m)),
        hostname: first_non_empty(sorted, CandidateObservation::host),
        sys_name: first_non_empty(sorted, CandidateObservation::sys),
        vendor: first_non_empty(sorted, CandidateObservation::vendor_name),
        model: first_non_empty(sorted, CandidateObservation::model_name),
        device_type: sorted.iter().find_map(|c| c.known_type()),
        interfaces,
        metadata,
        sources,
        confidence: sorted.iter().map(|c| c.confidence).max().unwrap_or(0),
    }
}

impl MergedObservation {
    /// Display name: sysName, then hostname, then IP, then a placeholder.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.sys_name
            .as_ref()
            .or(self.hostname.as_ref())
            .or(self.ip_address.as_ref())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string())
    }

    /// Most specific identity value, used to derive new device ids.
    fn identity_key(&self) -> String {
        self.mac_address
            .as_ref()
            .map(|m| format!("mac:{}", m))
            .or_else(|| self.ip_address.as_ref().map(|ip| format!("ip:{}", ip)))
            .or_else(|| {
                self.hostname
                    .as_ref()
                    .map(|h| format!("host:{}", h.to_lowercase()))
            })
            .or_else(|| {
                self.sys_name
                    .as_ref()
                    .map(|s| format!("sys:{}", s.to_lowercase()))
            })
            .unwrap_or_else(|| "anonymous".to_string())
    }

    /// Interfaces plus one synthesized from the merged MAC/IP when no
    /// interface carries them yet.
    fn interfaces_with_primary(&self) -> Vec<NetworkInterface> {
        let mut interfaces = self.interfaces.clone();

        let has_mac = self.mac_address.as_ref().is_some_and(|mac| {
            interfaces.iter().any(|iface| {
                iface
                    .mac_address
                    .as_deref()
                    .and_then(identity::normalize_mac)
                    .as_ref()
                    == Some(mac)
            })
        });
        let has_ip = self.ip_address.as_ref().is_some_and(|ip| {
            interfaces
                .iter()
                .any(|iface| iface.ip_address.as_ref() == Some(ip))
        });

        let needs_primary = match (&self.mac_address, &self.ip_address) {
            (Some(_), _) => !has_mac,
            (None, Some(_)) => !has_ip,
            (None, None) => false,
        };
        if needs_primary {
            interfaces.insert(
                0,
                NetworkInterface {
                    name: PRIMARY_INTERFACE_NAME.to_string(),
                    mac_address: self.mac_address.clone(),
                    ip_address: self.ip_address.clone(),
                    ..NetworkInterface::default()
                },
            );
        }

        interfaces
    }
}

// =============================================================================
// CORRELATOR
// =============================================================================

/// The entity resolver.
///
/// Construct one per process or tenant and inject it where batches arrive.
/// Methods take `&mut self`; callers behind parallel workers wrap the whole
/// correlator in one lock.
#[derive(Debug, Clone, Default)]
pub struct Correlator {
    config: CorrelatorConfig,
    index: IdentityIndex,
    devices: BTreeMap<DeviceId, Device>,
    next_sequence: u64,
}

impl Correlator {
    /// Create a correlator after validating its configuration.
    pub fn new(config: CorrelatorConfig) -> Result<Self, OtGraphError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn config(&self) -> &CorrelatorConfig {
        &self.config
    }

    /// Resolve a batch against the current clock.
    pub fn correlate(&mut self, batch: &[CandidateObservation]) -> Vec<CorrelationResult> {
        self.correlate_at(batch, Utc::now())
    }

    /// Resolve a batch with an explicit clock.
    ///
    /// Deterministic for the same batch, index state, configuration and `now`.
    pub fn correlate_at(
        &mut self,
        batch: &[CandidateObservation],
        now: DateTime<Utc>,
    ) -> Vec<CorrelationResult> {
        cluster_candidates(batch)
            .into_iter()
            .map(|cluster| self.resolve_cluster(cluster, now))
            .collect()
    }

    fn resolve_cluster(&mut self, cluster: Cluster<'_>, now: DateTime<Utc>) -> CorrelationResult {
        let Cluster { mut members, keys } = cluster;
        sort_by_priority(&mut members, &self.config);

        let existing = self.find_existing(&members);
        let merged = merge_candidates(&members);

        let mut correlated_by = keys;
        if let Some((_, key)) = existing {
            correlated_by.insert(key);
        }

        let score = confidence::score_candidates(
            &members,
            correlated_by.len(),
            now,
            self.config.staleness_minutes,
        );

        let (device_id, created) = match existing {
            Some((id, _)) => {
                self.update_device(id, &merged, score, now);
                (id, false)
            }
            None => (self.create_device(&merged, &members, score, now), true),
        };

        for member in &members {
            self.index.record(member, device_id);
        }

        let device = self
            .devices
            .get(&device_id)
            .cloned()
            .unwrap_or_else(|| Device::new(device_id, merged.display_name(), now));

        CorrelationResult {
            device,
            sources: merged.sources,
            confidence: score.score,
            correlated_by: correlated_by.into_iter().collect(),
            created,
        }
    }

    /// First index hit along the sorted cluster.
    fn find_existing(
        &self,
        sorted: &[&CandidateObservation],
    ) -> Option<(DeviceId, CorrelationKey)> {
        sorted
            .iter()
            .filter_map(|c| self.index.lookup(c))
            .find(|(id, _)| self.devices.contains_key(id))
    }

    fn allocate_id(&mut self, merged: &MergedObservation) -> DeviceId {
        self.next_sequence = self.next_sequence.saturating_add(1);
        let name = format!("{}#{}", merged.identity_key(), self.next_sequence);
        DeviceId(Uuid::new_v5(&DEVICE_ID_NAMESPACE, name.as_bytes()))
    }

    fn create_device(
        &mut self,
        merged: &MergedObservation,
        members: &[&CandidateObservation],
        score: ConfidenceScore,
        now: DateTime<Utc>,
    ) -> DeviceId {
        let id = self.allocate_id(merged);
        let mut device = Device::new(id, merged.display_name(), now);

        let device_type = merged.device_type.unwrap_or_default();
        let (level, zone) = classification::classify(device_type);
        device.hostname = merged.hostname.clone();
        device.device_type = device_type;
        device.vendor = merged.vendor.clone();
        device.model = merged.model.clone();
        device.purdue_level = level;
        device.security_zone = zone;
        device.status = DeviceStatus::Online;
        device.interfaces = merged.interfaces_with_primary();
        device.metadata = merged.metadata.clone();
        device.discovered_at = members
            .iter()
            .filter_map(|c| c.observed_at)
            .min()
            .map_or(now, |earliest| earliest.min(now));
        device.last_seen = members
            .iter()
            .filter_map(|c| c.observed_at)
            .max()
            .map_or(now, |latest| latest.min(now));

        apply_correlation_metadata(&mut device, merged, merged.sources.clone(), score);
        self.devices.insert(id, device);
        id
    }

    fn update_device(
        &mut self,
        id: DeviceId,
        merged: &MergedObservation,
        score: ConfidenceScore,
        now: DateTime<Utc>,
    ) {
        let Some(device) = self.devices.get_mut(&id) else {
            return;
        };

        if device.vendor.is_none() {
            device.vendor = merged.vendor.clone();
        }
        if device.model.is_none() {
            device.model = merged.model.clone();
        }
        if device.hostname.is_none() {
            device.hostname = merged.hostname.clone();
        }
        if device.has_placeholder_name() {
            device.name = merged.display_name();
        }
        if !device.device_type.is_known() {
            if let Some(device_type) = merged.device_type {
                let (level, zone) = classification::classify(device_type);
                device.device_type = device_type;
                device.purdue_level = level;
                device.security_zone = zone;
            }
        }

        let mut sources = device.sources();
        identity::merge_interfaces(&mut device.interfaces, merged.interfaces_with_primary());
        device.metadata.extend(
            merged
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        for source in &merged.sources {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }

        apply_correlation_metadata(device, merged, sources, score);
        device.status = DeviceStatus::Online;
        device.last_seen = now;
        device.updated_at = now;
    }

    /// Overwrite the level and zone of a resolved device.
    ///
    /// Used by external classifiers once `correlate` has returned.
    pub fn reclassify(
        &mut self,
        id: DeviceId,
        level: PurdueLevel,
        zone: SecurityZone,
    ) -> Result<&Device, OtGraphError> {
        let device = self
            .devices
            .get_mut(&id)
            .ok_or(OtGraphError::DeviceNotFound(id))?;
        device.purdue_level = level;
        device.security_zone = zone;
        Ok(device)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// All devices in id order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Device currently indexed under a MAC address.
    #[must_use]
    pub fn lookup_mac(&self, mac: &str) -> Option<DeviceId> {
        self.index.lookup_mac(mac)
    }

    /// Device currently indexed under an IP address.
    #[must_use]
    pub fn lookup_ip(&self, ip: &str) -> Option<DeviceId> {
        self.index.lookup_ip(ip)
    }

    /// Device currently indexed under a hostname.
    #[must_use]
    pub fn lookup_hostname(&self, hostname: &str) -> Option<DeviceId> {
        self.index.lookup_hostname(hostname)
    }

    /// Read access to the identity indices.
    #[must_use]
    pub fn index(&self) -> &IdentityIndex {
        &self.index
    }
}

/// Record sources, confidence and sysName in the device metadata.
fn apply_correlation_metadata(
    device: &mut Device,
    merged: &MergedObservation,
    sources: Vec<String>,
    score: ConfidenceScore,
) {
    device
        .metadata
        .insert(META_SOURCES.to_string(), MetaValue::text_list(sources));
    device.metadata.insert(
        META_CORRELATION_CONFIDENCE.to_string(),
        MetaValue::Int(i64::from(score.score)),
    );
    if let Some(sys_name) = &merged.sys_name {
        device
            .metadata
            .insert(META_SYS_NAME.to_string(), MetaValue::Text(sys_name.clone()));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).single().expect("valid time")
    }

    fn correlator() -> Correlator {
        Correlator::new(CorrelatorConfig::default()).expect("config")
    }

    #[test]
    fn empty_batch_yields_nothing() {
        let mut c = correlator();
        assert!(c.correlate_at(&[], t0()).is_empty());
        assert_eq!(c.device_count(), 0);
    }

    #[test]
    fn clustering_is_seed_only() {
        // A~B by IP, B~C by hostname, A and C share nothing.
        let batch = vec![
            CandidateObservation::new("arp", 60).with_ip("10.0.0.1"),
            CandidateObservation::new("snmp", 80)
                .with_ip("10.0.0.1")
                .with_hostname("rtu-7"),
            CandidateObservation::new("syslog", 30).with_hostname("rtu-7"),
        ];

        let clusters = cluster_candidates(&batch);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members.len(), 2);
        assert_eq!(clusters[1].members.len(), 1);
        assert_eq!(
            clusters[0].keys.iter().copied().collect::<Vec<_>>(),
            vec![CorrelationKey::Ip]
        );
    }

    #[test]
    fn priority_then_recency_ordering() {
        let config = CorrelatorConfig::default();
        let old_snmp = CandidateObservation::new("snmp", 50).observed_at(t0() - Duration::minutes(5));
        let new_snmp = CandidateObservation::new("snmp", 50).observed_at(t0());
        let untimed_snmp = CandidateObservation::new("snmp", 50);
        let arp = CandidateObservation::new("arp", 90).observed_at(t0());
        let manual = CandidateObservation::new("manual", 99).observed_at(t0());

        let mut members = vec![&manual, &arp, &untimed_snmp, &old_snmp, &new_snmp];
        sort_by_priority(&mut members, &config);

        assert!(std::ptr::eq(members[0], &new_snmp));
        assert!(std::ptr::eq(members[1], &old_snmp));
        assert!(std::ptr::eq(members[2], &untimed_snmp));
        assert!(std::ptr::eq(members[3], &arp));
        assert!(std::ptr::eq(members[4], &manual));
    }

    #[test]
    fn merge_takes_first_non_empty_scalar() {
        let a = CandidateObservation::new("snmp", 80)
            .with_vendor("")
            .with_model("S7-1500")
            .with_device_type(DeviceType::Unknown)
            .with_metadata("firmware", "2.9");
        let b = CandidateObservation::new("arp", 60)
            .with_vendor("Siemens")
            .with_model("S7-300")
            .with_device_type(DeviceType::Plc)
            .with_metadata("firmware", "2.8");

        let merged = merge_candidates(&[&a, &b]);
        assert_eq!(merged.vendor.as_deref(), Some("Siemens"));
        assert_eq!(merged.model.as_deref(), Some("S7-1500"));
        assert_eq!(merged.device_type, Some(DeviceType::Plc));
        // Metadata is shallow-merged left to right: later sources overwrite.
        assert_eq!(
            merged.metadata.get("firmware"),
            Some(&MetaValue::from("2.8"))
        );
        assert_eq!(merged.confidence, 80);
        assert_eq!(merged.sources, vec!["snmp".to_string(), "arp".to_string()]);
    }

    #[test]
    fn display_name_fallbacks() {
        let mut merged = MergedObservation::default();
        assert_eq!(merged.display_name(), UNKNOWN_DEVICE_NAME);
        merged.ip_address = Some("10.0.0.1".to_string());
        assert_eq!(merged.display_name(), "10.0.0.1");
        merged.hostname = Some("hmi-1".to_string());
        assert_eq!(merged.display_name(), "hmi-1");
        merged.sys_name = Some("HMI Line 1".to_string());
        assert_eq!(merged.display_name(), "HMI Line 1");
    }

    #[test]
    fn new_device_is_classified_and_online() {
        let mut c = correlator();
        let results = c.correlate_at(
            &[CandidateObservation::new("snmp", 80)
                .with_mac("00:1B:1B:AA:00:01")
                .with_ip("10.0.1.5")
                .with_device_type(DeviceType::Plc)],
            t0(),
        );

        assert_eq!(results.len(), 1);
        let device = &results[0].device;
        assert!(results[0].created);
        assert_eq!(device.name, "10.0.1.5");
        assert_eq!(device.purdue_level, PurdueLevel::L1);
        assert_eq!(device.security_zone, SecurityZone::Control);
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(device.interfaces.len(), 1);
        assert_eq!(device.interfaces[0].name, PRIMARY_INTERFACE_NAME);
        assert_eq!(
            device.interfaces[0].mac_address.as_deref(),
            Some("00:1b:1b:aa:00:01")
        );
        assert_eq!(device.sources(), vec!["snmp".to_string()]);
        assert_eq!(device.correlation_confidence(), Some(results[0].confidence));
    }

    #[test]
    fn anonymous_candidate_still_produces_device() {
        let mut c = correlator();
        let results = c.correlate_at(&[CandidateObservation::new("syslog", 20)], t0());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].device.name, UNKNOWN_DEVICE_NAME);
        assert_eq!(results[0].device.purdue_level, PurdueLevel::L5);
        assert!(results[0].correlated_by.is_empty());
        assert!(results[0].device.interfaces.is_empty());
        // 15 + 0 + 0.4 * 20 = 23
        assert_eq!(results[0].confidence, 23);
    }

    #[test]
    fn second_batch_updates_existing_device() {
        let mut c = correlator();
        let first = c.correlate_at(
            &[CandidateObservation::new("arp", 60)
                .with_mac("aa:bb:cc:00:00:01")
                .with_ip("10.0.2.10")],
            t0(),
        );
        let id = first[0].device.id;
        assert_eq!(first[0].device.device_type, DeviceType::Unknown);

        let later = t0() + Duration::minutes(3);
        let second = c.correlate_at(
            &[CandidateObservation::new("snmp", 85)
                .with_ip("10.0.2.10")
                .with_hostname("hmi-north")
                .with_vendor("Rockwell")
                .with_device_type(DeviceType::Hmi)],
            later,
        );

        assert_eq!(second.len(), 1);
        assert!(!second[0].created);
        assert_eq!(second[0].correlated_by, vec![CorrelationKey::Ip]);
        let device = &second[0].device;
        assert_eq!(device.id, id);
        assert_eq!(device.vendor.as_deref(), Some("Rockwell"));
        assert_eq!(device.hostname.as_deref(), Some("hmi-north"));
        assert_eq!(device.device_type, DeviceType::Hmi);
        assert_eq!(device.purdue_level, PurdueLevel::L2);
        assert_eq!(device.last_seen, later);
        assert_eq!(device.created_at, t0());
        assert_eq!(device.sources(), vec!["arp".to_string(), "snmp".to_string()]);
        assert_eq!(c.device_count(), 1);
        assert_eq!(c.lookup_hostname("HMI-NORTH"), Some(id));
    }

    #[test]
    fn candidate_metadata_cannot_replace_source_history() {
        let mut c = correlator();
        c.correlate_at(&[CandidateObservation::new("arp", 60).with_ip("10.0.0.1")], t0());

        let results = c.correlate_at(
            &[CandidateObservation::new("snmp", 80)
                .with_ip("10.0.0.1")
                .with_metadata(META_SOURCES, "collector-7")
                .with_metadata(META_CORRELATION_CONFIDENCE, "high")
                .with_metadata("rack", "B4")],
            t0(),
        );

        let device = &results[0].device;
        assert!(!results[0].created);
        assert_eq!(device.sources(), vec!["arp".to_string(), "snmp".to_string()]);
        assert_eq!(device.correlation_confidence(), Some(results[0].confidence));
        assert_eq!(device.metadata.get("rack"), Some(&MetaValue::from("B4")));
    }

    #[test]
    fn reserved_keys_are_dropped_on_create() {
        let candidate = CandidateObservation::new("snmp", 80)
            .with_hostname("plc-9")
            .with_metadata(META_SYS_NAME, "spoofed");
        let merged = merge_candidates(&[&candidate]);
        assert!(merged.metadata.is_empty());

        let mut c = correlator();
        let results = c.correlate_at(&[candidate], t0());
        assert!(!results[0].device.metadata.contains_key(META_SYS_NAME));
        assert_eq!(results[0].device.sources(), vec!["snmp".to_string()]);
    }

    #[test]
    fn created_device_spans_observation_times() {
        let mut c = correlator();
        let results = c.correlate_at(
            &[
                CandidateObservation::new("snmp", 80)
                    .with_ip("10.0.3.3")
                    .observed_at(t0() - Duration::minutes(4)),
                CandidateObservation::new("arp", 60)
                    .with_ip("10.0.3.3")
                    .observed_at(t0() - Duration::minutes(10)),
            ],
            t0(),
        );

        let device = &results[0].device;
        assert_eq!(device.discovered_at, t0() - Duration::minutes(10));
        assert_eq!(device.last_seen, t0() - Duration::minutes(4));

        let future = c.correlate_at(
            &[CandidateObservation::new("arp", 60)
                .with_ip("10.0.3.4")
                .observed_at(t0() + Duration::minutes(5))],
            t0(),
        );
        assert_eq!(future[0].device.last_seen, t0());
    }

    #[test]
    fn update_keeps_existing_vendor_and_type() {
        let mut c = correlator();
        c.correlate_at(
            &[CandidateObservation::new("snmp", 80)
                .with_hostname("rtu-3")
                .with_vendor("ABB")
                .with_device_type(DeviceType::Rtu)],
            t0(),
        );
        let results = c.correlate_at(
            &[CandidateObservation::new("syslog", 40)
                .with_hostname("RTU-3")
                .with_vendor("Unknown Corp")
                .with_device_type(DeviceType::Workstation)],
            t0(),
        );

        let device = &results[0].device;
        assert_eq!(device.vendor.as_deref(), Some("ABB"));
        assert_eq!(device.device_type, DeviceType::Rtu);
        assert_eq!(device.purdue_level, PurdueLevel::L1);
    }

    #[test]
    fn placeholder_name_is_upgraded_once_identity_appears() {
        let mut c = correlator();
        let first = c.correlate_at(
            &[CandidateObservation::new("netflow", 30).with_interface(
                NetworkInterface::new("eth0").with_mac("aa:aa:aa:aa:aa:aa"),
            )],
            t0(),
        );
        assert_eq!(first[0].device.name, UNKNOWN_DEVICE_NAME);

        // Interface MACs are not indexed, so this is a new device.
        let second = c.correlate_at(
            &[CandidateObservation::new("snmp", 80).with_sys_name("Boiler PLC")],
            t0(),
        );
        assert!(second[0].created);
        assert_eq!(second[0].device.name, "Boiler PLC");
        assert_eq!(c.device_count(), 2);
    }

    #[test]
    fn ids_are_deterministic_for_same_history() {
        let batch = vec![
            CandidateObservation::new("arp", 60).with_mac("aa:bb:cc:dd:ee:01"),
            CandidateObservation::new("arp", 60).with_mac("aa:bb:cc:dd:ee:02"),
        ];
        let mut a = correlator();
        let mut b = correlator();
        let ra = a.correlate_at(&batch, t0());
        let rb = b.correlate_at(&batch, t0());
        assert_eq!(ra, rb);
        assert_ne!(ra[0].device.id, ra[1].device.id);
    }

    #[test]
    fn index_points_only_at_owned_devices() {
        let mut c = correlator();
        c.correlate_at(
            &[
                CandidateObservation::new("arp", 60)
                    .with_mac("aa:bb:cc:dd:ee:01")
                    .with_ip("10.1.1.1"),
                CandidateObservation::new("snmp", 70).with_hostname("sw-core"),
            ],
            t0(),
        );
        assert!(!c.index().is_empty());
        for id in c.index().referenced_devices() {
            assert!(c.device(id).is_some());
        }
    }
}
