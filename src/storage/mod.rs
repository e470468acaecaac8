//! Event Log Storage
//!
//! Append-only persistence for health check results, healing records, and
//! system state snapshots, backed by Sled. Keys are big-endian timestamp
//! nanoseconds so iteration order is chronological.
//!
//! Appends are at-least-once: a duplicate write on retry overwrites the same
//! key, which is acceptable for an audit/history log. Writers treat append
//! failures as non-fatal: the control loop's availability takes priority
//! over completeness of the audit trail.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::types::{HealingRecord, HealthCheckResult, SystemState};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only event log with one tree per record family.
#[derive(Clone)]
pub struct EventLog {
    db: Arc<sled::Db>,
    checks: sled::Tree,
    healing: sled::Tree,
    snapshots: sled::Tree,
}

/// Key: timestamp as nanoseconds since epoch, big-endian (sorts chronologically).
fn ts_key(ts: DateTime<Utc>) -> [u8; 8] {
    ts.timestamp_nanos_opt()
        .unwrap_or_else(|| ts.timestamp().saturating_mul(1_000_000_000))
        .to_be_bytes()
}

impl EventLog {
    /// Open or create the event log at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref())?;
        let checks = db.open_tree("health_checks")?;
        let healing = db.open_tree("healing_results")?;
        let snapshots = db.open_tree("state_snapshots")?;

        info!(path = %path.as_ref().display(), "Event log opened");

        Ok(Self {
            db: Arc::new(db),
            checks,
            healing,
            snapshots,
        })
    }

    // ------------------------------------------------------------------
    // Appends
    // ------------------------------------------------------------------

    /// Append one health check result.
    ///
    /// Does not flush on each write; sled's background flushing provides
    /// durability. On crash, at most the last few writes may be lost, which
    /// is acceptable for data regenerated every cycle.
    pub fn append_check(&self, result: &HealthCheckResult) -> Result<(), StorageError> {
        let value = serde_json::to_vec(result)?;
        self.checks.insert(ts_key(result.timestamp), value)?;
        Ok(())
    }

    /// Append one healing record.
    pub fn append_healing(&self, record: &HealingRecord) -> Result<(), StorageError> {
        let value = serde_json::to_vec(record)?;
        self.healing.insert(ts_key(record.timestamp), value)?;
        Ok(())
    }

    /// Append one system state snapshot.
    pub fn append_snapshot(&self, snapshot: &SystemState) -> Result<(), StorageError> {
        let value = serde_json::to_vec(snapshot)?;
        self.snapshots.insert(ts_key(snapshot.timestamp), value)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Most recent N health checks, newest first.
    pub fn recent_checks(&self, limit: usize) -> Vec<HealthCheckResult> {
        recent(&self.checks, limit)
    }

    /// Most recent N healing records, newest first.
    pub fn recent_healing(&self, limit: usize) -> Vec<HealingRecord> {
        recent(&self.healing, limit)
    }

    /// Most recent N state snapshots, newest first.
    pub fn recent_snapshots(&self, limit: usize) -> Vec<SystemState> {
        recent(&self.snapshots, limit)
    }

    /// Health checks within a time range, oldest first.
    pub fn checks_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<HealthCheckResult> {
        in_range(&self.checks, start, end)
    }

    /// Healing records within a time range, oldest first.
    pub fn healing_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<HealingRecord> {
        in_range(&self.healing, start, end)
    }

    /// State snapshots within a time range, oldest first.
    pub fn snapshots_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<SystemState> {
        in_range(&self.snapshots, start, end)
    }

    /// Total records per family: (checks, healing, snapshots).
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.checks.len(), self.healing.len(), self.snapshots.len())
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Delete records older than `days_to_keep` across all trees.
    pub fn prune_older_than(&self, days_to_keep: i64) -> Result<usize, StorageError> {
        let cutoff = ts_key(Utc::now() - Duration::days(days_to_keep));
        let mut deleted = 0;

        for tree in [&self.checks, &self.healing, &self.snapshots] {
            let keys: Vec<_> = tree
                .iter()
                .keys()
                .filter_map(|k| k.ok())
                .take_while(|k| k.as_ref() < cutoff.as_slice())
                .collect();
            for key in keys {
                tree.remove(key)?;
                deleted += 1;
            }
        }

        if deleted > 0 {
            self.db.flush()?;
            debug!(deleted, days_to_keep, "Pruned old event log records");
        }

        Ok(deleted)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Newest-first scan of one tree, skipping undecodable values.
fn recent<T: DeserializeOwned>(tree: &sled::Tree, limit: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(limit);
    for item in tree.iter().rev() {
        if out.len() >= limit {
            break;
        }
        if let Ok((_key, value)) = item {
            if let Ok(record) = serde_json::from_slice::<T>(&value) {
                out.push(record);
            }
        }
    }
    out
}

/// Chronological range scan of one tree.
fn in_range<T: DeserializeOwned>(tree: &sled::Tree, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<T> {
    let mut out = Vec::new();
    for item in tree.range(ts_key(start)..=ts_key(end)) {
        if let Ok((_key, value)) = item {
            if let Ok(record) = serde_json::from_slice::<T>(&value) {
                out.push(record);
            }
        }
    }
    out
}

/// Append a record, logging and swallowing any failure.
///
/// A failed audit write must never abort the evaluation or healing decision
/// that produced it.
pub fn append_or_warn<F>(log: Option<&EventLog>, what: &str, append: F)
where
    F: FnOnce(&EventLog) -> Result<(), StorageError>,
{
    if let Some(log) = log {
        if let Err(e) = append(log) {
            tracing::warn!(record = what, error = %e, "Failed to persist record to event log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HealthStatus, SystemStatus, PriorityMode, ThroughputWindow};

    fn check(component: &str, ts: DateTime<Utc>) -> HealthCheckResult {
        HealthCheckResult {
            component: component.to_string(),
            status: HealthStatus::Healthy,
            message: "all thresholds within limits".to_string(),
            score: 1.0,
            response_time_ms: 3,
            error_count: 0,
            timestamp: ts,
        }
    }

    #[test]
    fn test_open_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path()).unwrap();
        assert_eq!(log.counts(), (0, 0, 0));
    }

    #[test]
    fn test_append_and_recent_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path()).unwrap();

        let t0 = Utc::now();
        log.append_check(&check("database", t0)).unwrap();
        log.append_check(&check("cpu", t0 + Duration::seconds(1))).unwrap();
        log.append_check(&check("cache", t0 + Duration::seconds(2))).unwrap();

        let recent = log.recent_checks(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].component, "cache");
        assert_eq!(recent[1].component, "cpu");
    }

    #[test]
    fn test_range_query_chronological() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path()).unwrap();

        let t0 = Utc::now();
        for i in 0..5 {
            log.append_check(&check("database", t0 + Duration::seconds(i))).unwrap();
        }

        let hits = log.checks_in_range(t0 + Duration::seconds(1), t0 + Duration::seconds(3));
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_prune_removes_old_records() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path()).unwrap();

        log.append_check(&check("database", Utc::now() - Duration::days(10))).unwrap();
        log.append_check(&check("database", Utc::now())).unwrap();

        let deleted = log.prune_older_than(7).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(log.counts().0, 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path()).unwrap();

        let snapshot = SystemState {
            cycle: 7,
            status: SystemStatus::Healthy,
            score: 65,
            heals_attempted: 3,
            heals_succeeded: 2,
            consecutive_heal_failures: 1,
            priority: PriorityMode::Baseline,
            quota: 100,
            uptime_secs: 3600,
            throughput: ThroughputWindow::default(),
            last_cycle_ms: 150,
            timestamp: Utc::now(),
        };
        log.append_snapshot(&snapshot).unwrap();

        let recent = log.recent_snapshots(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].cycle, 7);
        assert_eq!(recent[0].status, SystemStatus::Healthy);
    }
}
