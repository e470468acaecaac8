//! System-level state: status ladder, priority modes, and cycle snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// System Status
// ============================================================================

/// System operational status, derived from the cycle health score.
///
/// The ladder is total: every integer score maps to exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    /// Score >= 80. Everything running at full capability.
    Optimal,
    /// Score >= 60. Normal operation.
    Healthy,
    /// Score >= 40. Working, with some pressure.
    Active,
    /// Score >= 20. Recent failures, recovering capacity.
    Recovering,
    /// Score >= 0. Reduced capability.
    Degraded,
    /// Score < 0. Minimal work permitted.
    Maintenance,
}

impl SystemStatus {
    /// Map a health score onto the status ladder.
    pub fn from_score(score: i64) -> SystemStatus {
        if score >= 80 {
            SystemStatus::Optimal
        } else if score >= 60 {
            SystemStatus::Healthy
        } else if score >= 40 {
            SystemStatus::Active
        } else if score >= 20 {
            SystemStatus::Recovering
        } else if score >= 0 {
            SystemStatus::Degraded
        } else {
            SystemStatus::Maintenance
        }
    }

    /// Quota multiplier applied to the base budget.
    pub fn quota_multiplier(self) -> f64 {
        match self {
            SystemStatus::Optimal => 1.2,
            SystemStatus::Healthy => 1.0,
            SystemStatus::Active => 0.9,
            SystemStatus::Recovering => 0.7,
            SystemStatus::Degraded => 0.5,
            SystemStatus::Maintenance => 0.3,
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Optimal => write!(f, "Optimal"),
            SystemStatus::Healthy => write!(f, "Healthy"),
            SystemStatus::Active => write!(f, "Active"),
            SystemStatus::Recovering => write!(f, "Recovering"),
            SystemStatus::Degraded => write!(f, "Degraded"),
            SystemStatus::Maintenance => write!(f, "Maintenance"),
        }
    }
}

// ============================================================================
// Priority Mode
// ============================================================================

/// Time-window-derived weighting applied to quota calculation.
///
/// Selected from the demand calendar by date alone; see
/// [`scoring::priority`](crate::scoring::priority).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityMode {
    /// Named multi-day peak-demand event window.
    PeakEvent,
    /// Two demand seasons running at once.
    SeasonOverlap,
    HighSeason,
    MidSeason,
    LowSeason,
    Baseline,
}

impl PriorityMode {
    pub fn quota_multiplier(self) -> f64 {
        match self {
            PriorityMode::PeakEvent => 1.5,
            PriorityMode::SeasonOverlap => 1.4,
            PriorityMode::HighSeason => 1.3,
            PriorityMode::MidSeason => 1.2,
            PriorityMode::LowSeason => 1.1,
            PriorityMode::Baseline => 1.0,
        }
    }
}

impl std::fmt::Display for PriorityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityMode::PeakEvent => write!(f, "PeakEvent"),
            PriorityMode::SeasonOverlap => write!(f, "SeasonOverlap"),
            PriorityMode::HighSeason => write!(f, "HighSeason"),
            PriorityMode::MidSeason => write!(f, "MidSeason"),
            PriorityMode::LowSeason => write!(f, "LowSeason"),
            PriorityMode::Baseline => write!(f, "Baseline"),
        }
    }
}

// ============================================================================
// Throughput Window
// ============================================================================

/// Rolling opportunity/throughput payload fed by the work-discovery side.
///
/// The control loop consumes this as scorer input; it does not produce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputWindow {
    /// Work items discovered in the current window.
    pub opportunities_found: u64,
    /// Work items completed in the current window.
    pub items_processed: u64,
    pub window_started: DateTime<Utc>,
}

impl Default for ThroughputWindow {
    fn default() -> Self {
        Self {
            opportunities_found: 0,
            items_processed: 0,
            window_started: Utc::now(),
        }
    }
}

// ============================================================================
// System State Snapshot
// ============================================================================

/// One immutable snapshot of the running aggregate, produced per cycle.
///
/// Snapshots are appended to history and never updated in place, so the
/// status/quota series can be replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// Monotonic cycle counter.
    pub cycle: u64,
    pub status: SystemStatus,
    /// Raw health score the status was derived from.
    pub score: i64,
    /// Lifetime healing attempts.
    pub heals_attempted: u64,
    /// Lifetime successful heals.
    pub heals_succeeded: u64,
    /// Healing failures in a row as of this cycle.
    pub consecutive_heal_failures: u32,
    /// Active priority mode from the demand calendar.
    pub priority: PriorityMode,
    /// Derived capacity budget gating downstream work this cycle.
    pub quota: i64,
    pub uptime_secs: u64,
    /// Rolling throughput payload at snapshot time.
    pub throughput: ThroughputWindow,
    /// Duration of the cycle that produced this snapshot (ms).
    pub last_cycle_ms: u64,
    pub timestamp: DateTime<Utc>,
}
