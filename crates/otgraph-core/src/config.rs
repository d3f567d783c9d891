//! # Correlator Configuration
//!
//! The two knobs the resolver exposes to operators: which source wins a
//! conflict, and how fast observations go stale. Loading (TOML file,
//! environment) is the app layer's job; this type only holds and checks values.

use crate::OtGraphError;
use crate::primitives::{DEFAULT_SOURCE_PRIORITY, DEFAULT_STALENESS_MINUTES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelatorConfig {
    /// Source tags, highest priority first.
    pub source_priority: Vec<String>,
    /// Age in minutes at which an observation's freshness reaches zero.
    pub staleness_minutes: u32,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            source_priority: DEFAULT_SOURCE_PRIORITY
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            staleness_minutes: DEFAULT_STALENESS_MINUTES,
        }
    }
}

impl CorrelatorConfig {
    /// Build a configuration from explicit values.
    pub fn new<I, S>(source_priority: I, staleness_minutes: u32) -> Result<Self, OtGraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = Self {
            source_priority: source_priority.into_iter().map(Into::into).collect(),
            staleness_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// - `staleness_minutes` must be positive
    /// - source tags must be non-empty and unique (case-insensitive)
    pub fn validate(&self) -> Result<(), OtGraphError> {
        if self.staleness_minutes == 0 {
            return Err(OtGraphError::InvalidConfig(
                "staleness_minutes must be a positive integer".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for tag in &self.source_priority {
            let normalized = tag.trim().to_ascii_lowercase();
            if normalized.is_empty() {
                return Err(OtGraphError::InvalidConfig(
                    "source_priority contains an empty tag".to_string(),
                ));
            }
            if !seen.insert(normalized) {
                return Err(OtGraphError::InvalidConfig(format!(
                    "source_priority lists '{}' more than once",
                    tag
                )));
            }
        }
        Ok(())
    }

    /// Position of a source in the priority list; unlisted sources rank last.
    #[must_use]
    pub fn priority_rank(&self, source: &str) -> usize {
        self.source_priority
            .iter()
            .position(|tag| tag.trim().eq_ignore_ascii_case(source.trim()))
            .unwrap_or(self.source_priority.len())
    }
}
