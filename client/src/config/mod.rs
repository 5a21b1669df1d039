//! Configuration management

use anyhow::{Context, Result};
use location_validator::ValidationPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub validation: ValidationPolicy,
    #[serde(default)]
    pub visits: VisitsConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VisitsConfig {
    /// Refuse to log a visit whose location implies an impossible jump.
    /// When false the visit is stored and flagged.
    #[serde(default)]
    pub reject_unrealistic_jumps: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    #[serde(default = "default_geocoding_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub log_invalid_samples: bool,
    #[serde(default = "default_true")]
    pub log_jumps: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_directory")]
    pub export_directory: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_geocoding_url(),
            timeout_ms: default_geocoding_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_invalid_samples: true,
            log_jumps: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_directory: default_export_directory(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocoding_timeout_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    format!("fieldtrack/{}", env!("CARGO_PKG_VERSION"))
}

fn default_export_directory() -> String {
    ".".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .with_context(|| "Failed to parse config file")?;

        config.validation.check()
            .context("Invalid [validation] section")?;

        if config.geocoding.enabled && config.geocoding.base_url.trim().is_empty() {
            anyhow::bail!("geocoding.base_url must be set when geocoding is enabled");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [general]
            database_path = "visits.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.general.database_path, "visits.db");
        assert_eq!(config.validation, ValidationPolicy::default());
        assert!(!config.visits.reject_unrealistic_jumps);
        assert!(config.geocoding.enabled);
        assert_eq!(config.geocoding.timeout_ms, 5000);
        assert!(config.audit.log_jumps);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_policy_overrides() {
        let config = Config::parse(
            r#"
            [general]
            database_path = "visits.db"

            [validation]
            max_speed_mps = 42.0
            stale_after_secs = 600

            [visits]
            reject_unrealistic_jumps = true

            [geocoding]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.validation.max_speed_mps, 42.0);
        assert_eq!(config.validation.stale_after_secs, 600);
        assert_eq!(config.validation.coarse_accuracy_m, 100.0);
        assert!(config.visits.reject_unrealistic_jumps);
        assert!(!config.geocoding.enabled);
    }

    #[test]
    fn test_inconsistent_policy_is_rejected() {
        let result = Config::parse(
            r#"
            [general]
            database_path = "visits.db"

            [validation.quality]
            excellent_m = 80.0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(include_str!("../../../fieldtrack.example.toml")).unwrap();
        assert_eq!(config.validation, ValidationPolicy::default());
        assert_eq!(config.general.database_path, "fieldtrack.db");
    }

    #[test]
    fn test_missing_general_section() {
        assert!(Config::parse("[logging]\nlevel = \"debug\"").is_err());
    }
}
