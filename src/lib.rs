//! Vigil: Adaptive Health Monitoring & Self-Healing
//!
//! Periodic control loop that evaluates live component metrics against tiered
//! thresholds, aggregates them into one system status, fires debounced
//! healing triggers, executes corrective actions, and folds cumulative
//! results into a status/quota score gating downstream work.
//!
//! ## Architecture
//!
//! - **Monitor**: metrics provider seam, per-component evaluator, aggregator
//! - **Healing**: trigger engine with consecutive-failure debounce, action executor
//! - **Scoring**: additive health score, status ladder, demand-calendar priority
//! - **Pipeline**: the periodic cycle driver and shared application state

pub mod api;
pub mod config;
pub mod healing;
pub mod monitor;
pub mod pipeline;
pub mod scoring;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::MonitorConfig;

// Re-export commonly used types
pub use types::{
    ActionKind, FiredTrigger, HealingRecord, HealingResult, HealingTrigger, HealthCheckResult,
    HealthStatus, MetricKind, OverallHealth, PriorityMode, SystemState, SystemStatus, Threshold,
};

// Re-export the monitoring pipeline
pub use monitor::{aggregate, HealthEvaluator, MetricsProvider, ProviderError};
pub use pipeline::{AppState, MonitorLoop};

// Re-export healing
pub use healing::{ActionExecutor, ActionHandler, TriggerEngine};

// Re-export storage
pub use storage::{EventLog, StorageError};
