//! System-wide default constants.
//!
//! Centralises magic numbers used across the monitoring loop.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Monitor Loop
// ============================================================================

/// Interval between health check cycles (seconds).
pub const CHECK_INTERVAL_SECS: u64 = 30;

/// Cycle-duration warning threshold (ms). Cycles slower than this are logged.
pub const CYCLE_WARN_MS: u64 = 60_000;

// ============================================================================
// Healing
// ============================================================================

/// Hard cap on a single action handler's execution time (seconds).
///
/// A handler that exceeds this is marked failed and the healing cycle guard
/// is released, so a hung handler cannot wedge the loop forever.
pub const HANDLER_TIMEOUT_SECS: u64 = 300;

// ============================================================================
// Scoring
// ============================================================================

/// Base quota budget before status and priority multipliers.
pub const QUOTA_BASE: f64 = 100.0;

// ============================================================================
// Storage
// ============================================================================

/// Default data directory for the event log.
pub const DATA_DIR: &str = "./data";

/// Days of event history retained before pruning.
pub const RETENTION_DAYS: i64 = 30;

/// Default `limit` for recent-history API queries.
pub const RECENT_LIMIT: usize = 20;

/// Maximum `limit` accepted from API queries.
pub const RECENT_LIMIT_MAX: usize = 500;

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";
