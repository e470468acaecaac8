//! Application State
//!
//! Shared state for the monitoring loop, accessible from API handlers and the
//! healing task. Wrapped in `Arc<RwLock<>>` for access across the runtime.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    HealthCheckResult, OverallHealth, PriorityMode, SystemState, SystemStatus, ThroughputWindow,
};

/// Shared application state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Process start time (serializes as uptime seconds via `uptime_secs()`).
    #[serde(skip, default = "Instant::now")]
    pub started_at: Instant,

    /// Completed monitoring cycles.
    pub cycle_count: u64,

    /// Current system status from the scorer.
    pub status: SystemStatus,

    /// Latest aggregated health across all components.
    pub overall: Option<OverallHealth>,

    /// Latest per-component check results.
    pub latest_results: Vec<HealthCheckResult>,

    /// Latest immutable state snapshot.
    pub latest_snapshot: Option<SystemState>,

    /// Lifetime healing attempts.
    pub heals_attempted: u64,

    /// Lifetime successful heals.
    pub heals_succeeded: u64,

    /// Healing failures in a row.
    pub consecutive_heal_failures: u32,

    /// Rolling throughput fed by the work-discovery side.
    pub throughput: ThroughputWindow,

    /// Current quota budget gating downstream work.
    pub quota: i64,

    /// Active priority mode from the demand calendar.
    pub priority: PriorityMode,

    /// Duration of the last completed cycle (ms).
    pub last_cycle_ms: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            started_at: Instant::now(),
            cycle_count: 0,
            status: SystemStatus::Degraded,
            overall: None,
            latest_results: Vec::new(),
            latest_snapshot: None,
            heals_attempted: 0,
            heals_succeeded: 0,
            consecutive_heal_failures: 0,
            throughput: ThroughputWindow::default(),
            quota: 100,
            priority: PriorityMode::Baseline,
            last_cycle_ms: 0,
        }
    }
}

impl AppState {
    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Record one executed healing action's outcome.
    pub fn record_heal(&mut self, success: bool) {
        self.heals_attempted += 1;
        if success {
            self.heals_succeeded += 1;
            self.consecutive_heal_failures = 0;
        } else {
            self.consecutive_heal_failures += 1;
        }
    }

    /// Report discovered work items into the rolling throughput window.
    ///
    /// Called by the work-discovery side; the control loop only reads this.
    pub fn record_opportunities(&mut self, found: u64, processed: u64) {
        self.throughput.opportunities_found += found;
        self.throughput.items_processed += processed;
    }
}
