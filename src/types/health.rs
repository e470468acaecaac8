//! Health check types: statuses, tiered thresholds, and evaluation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Metric snapshot for one component: field name -> current value.
///
/// Supplied by the metrics provider at evaluation time. Ephemeral: the
/// monitoring subsystem persists results, never raw snapshots.
pub type MetricMap = HashMap<String, f64>;

// ============================================================================
// Health Status
// ============================================================================

/// Component health status.
///
/// `Unknown` is only produced when aggregating an empty result set; individual
/// evaluations always return one of the other four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Error,
    Unknown,
}

impl HealthStatus {
    /// Severity rank for worst-of aggregation (Error > Critical > Warning > Healthy).
    pub fn severity(self) -> u8 {
        match self {
            HealthStatus::Unknown => 0,
            HealthStatus::Healthy => 1,
            HealthStatus::Warning => 2,
            HealthStatus::Critical => 3,
            HealthStatus::Error => 4,
        }
    }

    /// The worse of two statuses.
    pub fn worst(self, other: HealthStatus) -> HealthStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Warning => write!(f, "Warning"),
            HealthStatus::Critical => write!(f, "Critical"),
            HealthStatus::Error => write!(f, "Error"),
            HealthStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

// ============================================================================
// Metric Kinds
// ============================================================================

/// Direction in which a metric gets worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricDirection {
    /// Larger values are worse (utilization, latency, error rate).
    HigherIsWorse,
    /// Smaller values are worse (hit rate, availability).
    LowerIsWorse,
}

/// The kind of measurement a threshold applies to.
///
/// Each kind carries a fixed alias list: the snapshot field names that can
/// satisfy it, in lookup order. The first present alias wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Utilization,
    ResponseTime,
    ErrorRate,
    HitRate,
    QueueDepth,
    Availability,
}

impl MetricKind {
    /// Snapshot field names that satisfy this metric kind, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            MetricKind::Utilization => &["utilization", "usage", "usage_percent", "load"],
            MetricKind::ResponseTime => &["response_time_ms", "latency_ms", "response_time", "p95_ms"],
            MetricKind::ErrorRate => &["error_rate", "failure_rate", "errors_per_min"],
            MetricKind::HitRate => &["hit_rate", "cache_hit_rate", "success_rate"],
            MetricKind::QueueDepth => &["queue_depth", "backlog", "pending_items"],
            MetricKind::Availability => &["availability", "uptime_ratio"],
        }
    }

    pub fn direction(self) -> MetricDirection {
        match self {
            MetricKind::Utilization
            | MetricKind::ResponseTime
            | MetricKind::ErrorRate
            | MetricKind::QueueDepth => MetricDirection::HigherIsWorse,
            MetricKind::HitRate | MetricKind::Availability => MetricDirection::LowerIsWorse,
        }
    }

    /// Extract this metric's value from a snapshot via the alias list.
    pub fn extract(self, metrics: &MetricMap) -> Option<f64> {
        self.aliases()
            .iter()
            .find_map(|alias| metrics.get(*alias).copied())
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Utilization => write!(f, "utilization"),
            MetricKind::ResponseTime => write!(f, "response_time"),
            MetricKind::ErrorRate => write!(f, "error_rate"),
            MetricKind::HitRate => write!(f, "hit_rate"),
            MetricKind::QueueDepth => write!(f, "queue_depth"),
            MetricKind::Availability => write!(f, "availability"),
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Tiered limits for one (component, metric) pair.
///
/// Invariant: `warning` is crossed before `critical`, `critical` before
/// `error`, in the metric's worse direction. Static configuration, loaded once
/// at startup and never mutated by the control loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threshold {
    /// Component this threshold applies to.
    pub component: String,
    /// What is being measured.
    pub metric: MetricKind,
    /// First tier, degradation worth reporting.
    pub warning: f64,
    /// Second tier, degradation requiring attention.
    pub critical: f64,
    /// Final tier: the component is considered failed.
    pub error: f64,
}

/// Outcome of classifying one measured value against one threshold.
#[derive(Debug, Clone)]
pub struct ThresholdVerdict {
    pub status: HealthStatus,
    pub score: f64,
    /// Tier that was crossed: "error", "critical", "warning", or "ok".
    pub tier: &'static str,
    pub value: f64,
}

impl Threshold {
    /// Check the tier ordering invariant for this threshold's direction.
    pub fn is_well_ordered(&self) -> bool {
        match self.metric.direction() {
            MetricDirection::HigherIsWorse => {
                self.warning < self.critical && self.critical < self.error
            }
            MetricDirection::LowerIsWorse => {
                self.warning > self.critical && self.critical > self.error
            }
        }
    }

    /// Whether `value` has crossed `limit` in the worse direction.
    fn crossed(&self, value: f64, limit: f64) -> bool {
        match self.metric.direction() {
            MetricDirection::HigherIsWorse => value >= limit,
            MetricDirection::LowerIsWorse => value <= limit,
        }
    }

    /// Classify a measured value against the three tiers.
    ///
    /// A critical crossing reports `Warning` status at a reduced score rather
    /// than `Critical`: the critical tier escalates the message and score, and
    /// only the error tier marks the component failed.
    pub fn classify(&self, value: f64) -> ThresholdVerdict {
        if self.crossed(value, self.error) {
            ThresholdVerdict { status: HealthStatus::Error, score: 0.0, tier: "error", value }
        } else if self.crossed(value, self.critical) {
            ThresholdVerdict { status: HealthStatus::Warning, score: 0.3, tier: "critical", value }
        } else if self.crossed(value, self.warning) {
            ThresholdVerdict { status: HealthStatus::Warning, score: 0.7, tier: "warning", value }
        } else {
            ThresholdVerdict { status: HealthStatus::Healthy, score: 1.0, tier: "ok", value }
        }
    }
}

// ============================================================================
// Evaluation Results
// ============================================================================

/// Result of evaluating one component's metrics against its thresholds.
///
/// Created once per evaluation, appended to the event log, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Component that was evaluated.
    pub component: String,
    /// Worst status across all matched thresholds.
    pub status: HealthStatus,
    /// Human-readable explanation of the status.
    pub message: String,
    /// Minimum score across thresholds, in [0, 1].
    pub score: f64,
    /// Wall-clock time spent on the evaluation (ms), including the provider call.
    pub response_time_ms: u64,
    /// Number of error-tier findings (1 for provider failures).
    pub error_count: u32,
    /// Evaluation timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Count of results per status value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
    pub error: usize,
}

impl StatusBreakdown {
    pub fn record(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::Warning => self.warning += 1,
            HealthStatus::Critical => self.critical += 1,
            HealthStatus::Error => self.error += 1,
            HealthStatus::Unknown => {}
        }
    }

    pub fn total(&self) -> usize {
        self.healthy + self.warning + self.critical + self.error
    }
}

/// Per-component summary inside an [`OverallHealth`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDetail {
    pub status: HealthStatus,
    pub score: f64,
    pub message: String,
}

/// System-wide health combined from all component checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealth {
    /// Worst status among all results; `Unknown` when there are none.
    pub status: HealthStatus,
    /// Arithmetic mean of per-result scores.
    pub score: f64,
    /// Count per status value.
    pub breakdown: StatusBreakdown,
    /// Per-component detail for downstream reporting.
    pub components: BTreeMap<String, ComponentDetail>,
    pub timestamp: DateTime<Utc>,
}
