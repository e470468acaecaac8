//! Core domain types shared across the monitoring and healing subsystems.

pub mod health;
pub mod healing;
pub mod state;

pub use health::{
    ComponentDetail, HealthCheckResult, HealthStatus, MetricDirection, MetricKind, MetricMap,
    OverallHealth, StatusBreakdown, Threshold, ThresholdVerdict,
};
pub use healing::{
    ActionKind, FiredTrigger, HealingRecord, HealingResult, HealingTrigger, TriggerDirection,
};
pub use state::{PriorityMode, SystemState, SystemStatus, ThroughputWindow};
