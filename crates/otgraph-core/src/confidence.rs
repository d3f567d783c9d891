//! # Confidence Module
//!
//! Confidence scoring for correlation results.
//!
//! The score has three terms:
//! - freshness-weighted source count: `min(45, 15 · Σ freshness)`
//! - identity-match strength: `15 · |correlated_by|`
//! - inherited trust: `0.4 · weighted mean of candidate confidence`
//!   (weights = freshness)
//!
//! Freshness decays linearly from 1 to 0 across the staleness window.
//! Everything is computed in thousandths with integer arithmetic, then
//! rounded half-up and clamped to 0..=100.

use crate::CandidateObservation;
use crate::primitives::{
    FRESHNESS_SCALE, MATCH_POINTS, MAX_CONFIDENCE, SOURCE_POINTS, SOURCE_POINTS_CAP,
    TRUST_DENOMINATOR, TRUST_NUMERATOR,
};
use chrono::{DateTime, Utc};

/// Confidence score for one correlation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfidenceScore {
    /// Score from 0 to 100.
    pub score: u8,
    /// Sum of candidate freshness, in thousandths.
    pub freshness_total: u64,
    /// Number of candidates that contributed.
    pub candidate_count: usize,
    /// Number of identity key kinds that linked the result.
    pub match_count: usize,
}

impl ConfidenceScore {
    /// Zero confidence (no evidence).
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Freshness of an observation in thousandths.
///
/// - No timestamp: fully fresh (older collectors never set one).
/// - Timestamp in the future: fully fresh.
/// - Otherwise `1000 · (1 − age / window)`, floored at 0.
#[must_use]
pub fn freshness(
    observed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    staleness_minutes: u32,
) -> u64 {
    let Some(observed_at) = observed_at else {
        return FRESHNESS_SCALE;
    };

    let age_ms = now.signed_duration_since(observed_at).num_milliseconds();
    if age_ms <= 0 {
        return FRESHNESS_SCALE;
    }

    let window_ms = u64::from(staleness_minutes.max(1)).saturating_mul(60_000);
    let decay = (age_ms as u64).saturating_mul(FRESHNESS_SCALE) / window_ms;
    FRESHNESS_SCALE.saturating_sub(decay)
}

/// Score a cluster of candidates.
///
/// `match_count` is the number of distinct identity key kinds in
/// `correlated_by`. With every freshness at zero the trust term is zero.
#[must_use]
pub fn score_candidates(
    candidates: &[&CandidateObservation],
    match_count: usize,
    now: DateTime<Utc>,
    staleness_minutes: u32,
) -> ConfidenceScore {
    if candidates.is_empty() {
        return ConfidenceScore {
            match_count,
            ..ConfidenceScore::zero()
        };
    }

    let mut freshness_total: u64 = 0;
    let mut weighted_confidence: u64 = 0;
    for candidate in candidates {
        let f = freshness(candidate.observed_at, now, staleness_minutes);
        freshness_total = freshness_total.saturating_add(f);
        weighted_confidence =
            weighted_confidence.saturating_add(u64::from(candidate.confidence.min(MAX_CONFIDENCE)) * f);
    }

    // Term 1: freshness-weighted source count, in thousandths of a point.
    let source_term = (SOURCE_POINTS * freshness_total).min(SOURCE_POINTS_CAP * FRESHNESS_SCALE);

    // Term 2: identity-match strength.
    let match_term = MATCH_POINTS
        .saturating_mul(match_count as u64)
        .saturating_mul(FRESHNESS_SCALE);

    // Term 3: inherited trust.
    let trust_term = if freshness_total == 0 {
        0
    } else {
        let mean = weighted_confidence.saturating_mul(FRESHNESS_SCALE) / freshness_total;
        mean.saturating_mul(TRUST_NUMERATOR) / TRUST_DENOMINATOR
    };

    let total = source_term
        .saturating_add(match_term)
        .saturating_add(trust_term);
    let rounded = total.saturating_add(FRESHNESS_SCALE / 2) / FRESHNESS_SCALE;

    ConfidenceScore {
        score: rounded.min(u64::from(MAX_CONFIDENCE)) as u8,
        freshness_total,
        candidate_count: candidates.len(),
        match_count,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid time")
    }

    fn candidate(confidence: u8, observed_at: Option<DateTime<Utc>>) -> CandidateObservation {
        CandidateObservation {
            observed_at,
            ..CandidateObservation::new("snmp", confidence)
        }
    }

    #[test]
    fn freshness_without_timestamp_is_full() {
        assert_eq!(freshness(None, now(), 15), 1000);
    }

    #[test]
    fn freshness_decays_linearly() {
        let half = now() - Duration::seconds(450);
        assert_eq!(freshness(Some(half), now(), 15), 500);

        let stale = now() - Duration::minutes(15);
        assert_eq!(freshness(Some(stale), now(), 15), 0);

        let ancient = now() - Duration::days(3);
        assert_eq!(freshness(Some(ancient), now(), 15), 0);
    }

    #[test]
    fn freshness_of_future_timestamp_is_full() {
        let future = now() + Duration::minutes(5);
        assert_eq!(freshness(Some(future), now(), 15), 1000);
    }

    #[test]
    fn single_fresh_candidate() {
        let c = candidate(80, Some(now()));
        let score = score_candidates(&[&c], 0, now(), 15);
        // 15 + 0 + 0.4 * 80 = 47
        assert_eq!(score.score, 47);
        assert_eq!(score.candidate_count, 1);
        assert_eq!(score.freshness_total, 1000);
    }

    #[test]
    fn two_sources_with_mac_match() {
        let a = candidate(80, Some(now()));
        let b = candidate(60, Some(now()));
        let score = score_candidates(&[&a, &b], 1, now(), 15);
        // 30 + 15 + 0.4 * 70 = 73
        assert_eq!(score.score, 73);
    }

    #[test]
    fn source_term_is_capped() {
        let cs: Vec<_> = (0..6).map(|_| candidate(0, None)).collect();
        let refs: Vec<_> = cs.iter().collect();
        let score = score_candidates(&refs, 0, now(), 15);
        assert_eq!(score.score, 45);
    }

    #[test]
    fn score_is_clamped_to_100() {
        let cs: Vec<_> = (0..4).map(|_| candidate(100, None)).collect();
        let refs: Vec<_> = cs.iter().collect();
        let score = score_candidates(&refs, 4, now(), 15);
        assert_eq!(score.score, 100);
    }

    #[test]
    fn all_stale_candidates_score_only_matches() {
        let stale = now() - Duration::hours(2);
        let a = candidate(90, Some(stale));
        let b = candidate(90, Some(stale));
        let score = score_candidates(&[&a, &b], 2, now(), 15);
        assert_eq!(score.freshness_total, 0);
        assert_eq!(score.score, 30);
    }

    #[test]
    fn empty_cluster_scores_zero() {
        let score = score_candidates(&[], 0, now(), 15);
        assert_eq!(score, ConfidenceScore::zero());
    }

    #[test]
    fn aging_equal_confidence_candidate_never_raises_score() {
        let fresh = candidate(70, Some(now()));
        let mut previous = u8::MAX;
        for minutes in 0..=20 {
            let aged = candidate(70, Some(now() - Duration::minutes(minutes)));
            let score = score_candidates(&[&fresh, &aged], 1, now(), 15).score;
            assert!(score <= previous, "score rose at {} minutes", minutes);
            previous = score;
        }
    }
}
