//! # Configuration
//!
//! TOML file plus environment overrides.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `otgraph.toml` (or the file passed with `--config`)
//! 3. `OTGRAPH_SOURCE_PRIORITY` (comma-separated) and `OTGRAPH_STALENESS_MINUTES`
//! 4. Command-line flags
//!
//! ```toml
//! [correlator]
//! source_priority = ["snmp", "arp", "mac_table", "netflow", "syslog"]
//! staleness_minutes = 15
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```

use otgraph_core::{CorrelatorConfig, OtGraphError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "otgraph.toml";

/// Maximum size of a configuration file.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub correlator: CorrelatorConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when `path` is `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    /// Environment overrides are applied and the result validated.
    pub fn load(path: Option<&Path>) -> Result<Self, OtGraphError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, OtGraphError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            OtGraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(OtGraphError::InvalidConfig(format!(
                "Config file '{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            OtGraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, OtGraphError> {
        toml::from_str(content)
            .map_err(|e| OtGraphError::InvalidConfig(format!("Invalid TOML: {}", e)))
    }

    /// Apply `OTGRAPH_SOURCE_PRIORITY` and `OTGRAPH_STALENESS_MINUTES`.
    pub fn apply_env(&mut self) -> Result<(), OtGraphError> {
        self.apply_overrides(
            std::env::var("OTGRAPH_SOURCE_PRIORITY").ok().as_deref(),
            std::env::var("OTGRAPH_STALENESS_MINUTES").ok().as_deref(),
        )
    }

    /// Apply raw override strings; `None` and blank values leave fields alone.
    pub fn apply_overrides(
        &mut self,
        source_priority: Option<&str>,
        staleness_minutes: Option<&str>,
    ) -> Result<(), OtGraphError> {
        if let Some(raw) = source_priority.map(str::trim).filter(|s| !s.is_empty()) {
            self.correlator.source_priority = raw
                .split(',')
                .map(|tag| tag.trim().to_string())
                .collect();
        }
        if let Some(raw) = staleness_minutes.map(str::trim).filter(|s| !s.is_empty()) {
            self.correlator.staleness_minutes = raw.parse().map_err(|_| {
                OtGraphError::InvalidConfig(format!(
                    "staleness_minutes must be a positive integer, got '{}'",
                    raw
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), OtGraphError> {
        self.correlator.validate()?;
        if self.server.host.trim().is_empty() {
            return Err(OtGraphError::InvalidConfig(
                "server.host must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml_str("").expect("parse"), AppConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [correlator]
            staleness_minutes = 30

            [server]
            port = 9000
            "#,
        )
        .expect("parse");

        assert_eq!(config.correlator.staleness_minutes, 30);
        assert_eq!(config.correlator.source_priority[0], "snmp");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.addr(), "127.0.0.1:9000");
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("[correlator\nstaleness_minutes = "),
            Err(OtGraphError::InvalidConfig(_))
        ));
    }

    #[test]
    fn overrides_replace_fields() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(Some(" manual , snmp "), Some("5"))
            .expect("overrides");
        assert_eq!(config.correlator.source_priority, vec!["manual", "snmp"]);
        assert_eq!(config.correlator.staleness_minutes, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("  "), None).expect("overrides");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_overrides_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_overrides(None, Some("soon")).is_err());

        let mut config = AppConfig::default();
        config.apply_overrides(None, Some("0")).expect("parses");
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.apply_overrides(Some("snmp,SNMP"), None).expect("parses");
        assert!(config.validate().is_err());
    }
}
