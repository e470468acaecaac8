//! Monitor Configuration - thresholds, triggers, and loop timing as TOML values
//!
//! Every operational boundary is a field in this module. Each struct
//! implements `Default` with built-in values, ensuring the loop runs with
//! sensible behavior when no config file is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::{ActionKind, HealingTrigger, MetricKind, Threshold, TriggerDirection};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitor deployment.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$VIGIL_CONFIG` env var
/// 2. `./vigil.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Deployment identification
    #[serde(default)]
    pub service: ServiceInfo,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Health check loop timing
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Healing executor tuning
    #[serde(default)]
    pub healing: HealingSection,

    /// Scorer inputs not derived from the loop itself
    #[serde(default)]
    pub scoring: ScoringSection,

    /// Event log location and retention
    #[serde(default)]
    pub storage: StorageSection,

    /// Threshold table: tiered limits per (component, metric)
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<Threshold>,

    /// Healing trigger set: condition-threshold-action bindings
    #[serde(default = "default_triggers")]
    pub triggers: Vec<HealingTrigger>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            service: ServiceInfo::default(),
            server: ServerConfig::default(),
            monitor: MonitorSection::default(),
            healing: HealingSection::default(),
            scoring: ScoringSection::default(),
            storage: StorageSection::default(),
            thresholds: default_thresholds(),
            triggers: default_triggers(),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Deployment identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Instance name used in logs and API responses.
    #[serde(default = "default_instance")]
    pub instance: String,
}

fn default_instance() -> String {
    "vigil-01".to_string()
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self { instance: default_instance() }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: default_addr() }
    }
}

/// Health check loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSection {
    /// Seconds between health check cycles.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Cycles slower than this (ms) are logged at warn level.
    #[serde(default = "default_cycle_warn")]
    pub cycle_warn_ms: u64,
}

fn default_check_interval() -> u64 {
    defaults::CHECK_INTERVAL_SECS
}

fn default_cycle_warn() -> u64 {
    defaults::CYCLE_WARN_MS
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            cycle_warn_ms: default_cycle_warn(),
        }
    }
}

/// Healing executor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingSection {
    /// Hard cap on one handler's execution time (seconds).
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_secs: u64,
}

fn default_handler_timeout() -> u64 {
    defaults::HANDLER_TIMEOUT_SECS
}

impl Default for HealingSection {
    fn default() -> Self {
        Self { handler_timeout_secs: default_handler_timeout() }
    }
}

/// Scorer inputs set by the operator rather than the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSection {
    /// Whether downstream auto-commit is enabled. Disabled costs score.
    #[serde(default = "default_auto_commit")]
    pub auto_commit: bool,
}

fn default_auto_commit() -> bool {
    true
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self { auto_commit: default_auto_commit() }
    }
}

/// Event log location and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Days of event history retained before pruning.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_data_dir() -> String {
    defaults::DATA_DIR.to_string()
}

fn default_retention_days() -> i64 {
    defaults::RETENTION_DAYS
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            retention_days: default_retention_days(),
        }
    }
}

// ============================================================================
// Built-in Tables
// ============================================================================

fn threshold(component: &str, metric: MetricKind, warning: f64, critical: f64, error: f64) -> Threshold {
    Threshold {
        component: component.to_string(),
        metric,
        warning,
        critical,
        error,
    }
}

/// Built-in threshold table covering the standard component set.
pub fn default_thresholds() -> Vec<Threshold> {
    vec![
        threshold("memory", MetricKind::Utilization, 0.60, 0.80, 0.90),
        threshold("cpu", MetricKind::Utilization, 0.70, 0.85, 0.95),
        threshold("database", MetricKind::ResponseTime, 250.0, 500.0, 1000.0),
        threshold("database", MetricKind::ErrorRate, 0.01, 0.05, 0.10),
        threshold("api_client", MetricKind::ResponseTime, 500.0, 1000.0, 2000.0),
        threshold("api_client", MetricKind::ErrorRate, 0.05, 0.15, 0.30),
        threshold("cache", MetricKind::HitRate, 0.80, 0.60, 0.40),
        threshold("pipeline", MetricKind::QueueDepth, 100.0, 500.0, 1000.0),
        threshold("model_engine", MetricKind::Availability, 0.99, 0.95, 0.90),
    ]
}

fn trigger(
    target: &str,
    condition: &str,
    threshold: f64,
    direction: TriggerDirection,
    consecutive_failures: u32,
    action: ActionKind,
) -> HealingTrigger {
    HealingTrigger {
        target: target.to_string(),
        condition: condition.to_string(),
        threshold,
        direction,
        consecutive_failures,
        action,
    }
}

/// Built-in healing trigger set.
///
/// Multiple triggers may share a target at different severities: the sustained
/// 80% CPU trigger scales, the acute 95% trigger restarts.
pub fn default_triggers() -> Vec<HealingTrigger> {
    use TriggerDirection::{Above, Below};
    vec![
        trigger("cpu", "cpu_usage", 0.80, Above, 2, ActionKind::Scale),
        trigger("cpu", "cpu_usage", 0.95, Above, 1, ActionKind::Restart),
        trigger("memory", "memory_usage", 0.90, Above, 2, ActionKind::Cleanup),
        trigger("database", "connection_errors", 5.0, Above, 3, ActionKind::Restart),
        trigger("database", "availability", 0.50, Below, 1, ActionKind::EnableBackup),
        trigger("api_client", "error_rate", 0.25, Above, 2, ActionKind::SwitchProvider),
        trigger("cache", "hit_rate", 0.40, Below, 3, ActionKind::Optimize),
        trigger("pipeline", "queue_depth", 1000.0, Above, 2, ActionKind::AdjustParameters),
        trigger("model_engine", "accuracy", 0.55, Below, 5, ActionKind::Retrain),
    ]
}

// ============================================================================
// Loading & Validation
// ============================================================================

/// Configuration load/parse/validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$VIGIL_CONFIG` environment variable
    /// 2. `./vigil.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("VIGIL_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), instance = %config.service.instance, "Loaded config from VIGIL_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from VIGIL_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "VIGIL_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("vigil.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(instance = %config.service.instance, "Loaded config from ./vigil.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./vigil.toml, using defaults");
                }
            }
        }

        info!("No vigil.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the static tables.
    ///
    /// Thresholds must tier in the metric's worse direction; triggers need a
    /// debounce of at least one cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for t in &self.thresholds {
            if !t.is_well_ordered() {
                return Err(ConfigError::Invalid(format!(
                    "threshold for ({}, {}) is not tiered warning -> critical -> error \
                     in the metric's worse direction ({}, {}, {})",
                    t.component, t.metric, t.warning, t.critical, t.error
                )));
            }
        }
        for t in &self.triggers {
            if t.consecutive_failures == 0 {
                return Err(ConfigError::Invalid(format!(
                    "trigger ({}, {}) requires consecutive_failures >= 1",
                    t.target, t.condition
                )));
            }
            if !t.threshold.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "trigger ({}, {}) has a non-finite threshold",
                    t.target, t.condition
                )));
            }
        }
        if self.monitor.check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitor.check_interval_secs must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Distinct component names appearing in the threshold table, in order of
    /// first appearance.
    pub fn components(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for t in &self.thresholds {
            if !out.contains(&t.component) {
                out.push(t.component.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        config.validate().unwrap();
        assert!(!config.thresholds.is_empty());
        assert!(!config.triggers.is_empty());
    }

    #[test]
    fn test_components_deduplicated() {
        let config = MonitorConfig::default();
        let components = config.components();
        // "database" appears twice in the threshold table but once here.
        assert_eq!(components.iter().filter(|c| c.as_str() == "database").count(), 1);
        assert!(components.contains(&"memory".to_string()));
    }

    #[test]
    fn test_validate_rejects_misordered_threshold() {
        let mut config = MonitorConfig::default();
        config.thresholds.push(Threshold {
            component: "bogus".to_string(),
            metric: MetricKind::Utilization,
            warning: 0.9,
            critical: 0.8,
            error: 0.6,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let mut config = MonitorConfig::default();
        config.triggers[0].consecutive_failures = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let toml_str = r#"
            [service]
            instance = "edge-7"

            [monitor]
            check_interval_secs = 5
        "#;
        let config: MonitorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.instance, "edge-7");
        assert_eq!(config.monitor.check_interval_secs, 5);
        // Untouched sections fall back to defaults.
        assert_eq!(config.healing.handler_timeout_secs, defaults::HANDLER_TIMEOUT_SECS);
        assert!(!config.thresholds.is_empty());
    }

    #[test]
    fn test_trigger_toml_round_trip() {
        let config = MonitorConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let back: MonitorConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(back.triggers.len(), config.triggers.len());
        assert_eq!(back.thresholds.len(), config.thresholds.len());
    }
}
