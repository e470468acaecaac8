//! Self-healing types: triggers, corrective actions, and their outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Actions
// ============================================================================

/// Corrective action kind, dispatched to a registered handler.
///
/// Closed set: adding a kind is a compile-time-checked change to every
/// exhaustive match, not a stringly-typed runtime surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Add capacity to the target component.
    Scale,
    /// Restart the target component.
    Restart,
    /// Fail over to an alternate upstream provider.
    SwitchProvider,
    /// Re-tune operating parameters.
    AdjustParameters,
    /// Free resources (caches, temp data, stale sessions).
    Cleanup,
    /// Run an optimization pass over the target.
    Optimize,
    /// Retrain the analysis model backing the target.
    Retrain,
    /// Bring a standby replica online.
    EnableBackup,
}

impl ActionKind {
    /// All kinds, in dispatch-registration order.
    pub const ALL: [ActionKind; 8] = [
        ActionKind::Scale,
        ActionKind::Restart,
        ActionKind::SwitchProvider,
        ActionKind::AdjustParameters,
        ActionKind::Cleanup,
        ActionKind::Optimize,
        ActionKind::Retrain,
        ActionKind::EnableBackup,
    ];
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Scale => write!(f, "scale"),
            ActionKind::Restart => write!(f, "restart"),
            ActionKind::SwitchProvider => write!(f, "switch_provider"),
            ActionKind::AdjustParameters => write!(f, "adjust_parameters"),
            ActionKind::Cleanup => write!(f, "cleanup"),
            ActionKind::Optimize => write!(f, "optimize"),
            ActionKind::Retrain => write!(f, "retrain"),
            ActionKind::EnableBackup => write!(f, "enable_backup"),
        }
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// Direction in which a trigger's condition crosses its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerDirection {
    /// Out of bounds when the value is at or above the threshold.
    Above,
    /// Out of bounds when the value is at or below the threshold.
    Below,
}

impl Default for TriggerDirection {
    fn default() -> Self {
        TriggerDirection::Above
    }
}

impl TriggerDirection {
    pub fn out_of_bounds(self, value: f64, threshold: f64) -> bool {
        match self {
            TriggerDirection::Above => value >= threshold,
            TriggerDirection::Below => value <= threshold,
        }
    }
}

/// A condition-threshold-action binding that decides when to self-heal.
///
/// Static configuration, analogous to [`Threshold`](super::Threshold) but
/// paired with an action rather than a status. The `consecutive_failures`
/// debounce suppresses noise: the condition must hold for that many cycles in
/// a row before the action fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingTrigger {
    /// Component the action targets.
    pub target: String,
    /// Snapshot field name the condition reads.
    pub condition: String,
    /// Numeric boundary for the condition.
    pub threshold: f64,
    /// Crossing direction (defaults to `above`).
    #[serde(default)]
    pub direction: TriggerDirection,
    /// Required consecutive out-of-bounds cycles before firing.
    pub consecutive_failures: u32,
    /// Action dispatched when the trigger fires.
    pub action: ActionKind,
}

impl HealingTrigger {
    /// Describe the firing condition, used as the `reason` on healing records.
    pub fn description(&self) -> String {
        let op = match self.direction {
            TriggerDirection::Above => ">=",
            TriggerDirection::Below => "<=",
        };
        format!(
            "{} {} {} for {} consecutive cycles",
            self.condition, op, self.threshold, self.consecutive_failures
        )
    }
}

/// A trigger whose debounce window has been satisfied this cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredTrigger {
    pub trigger: HealingTrigger,
    /// Condition value observed on the firing cycle.
    pub observed: f64,
    /// Consecutive out-of-bounds cycles at firing time.
    pub streak: u32,
    pub fired_at: DateTime<Utc>,
}

// ============================================================================
// Healing Outcomes
// ============================================================================

/// Normalized outcome of one executed action. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingResult {
    pub success: bool,
    /// Wall-clock duration around the handler call, measured by the executor.
    pub duration_ms: u64,
    /// Free-form handler payload.
    pub detail: serde_json::Value,
    /// Handler's own estimate of how often this action succeeds, if it has one.
    pub success_rate: Option<f64>,
}

/// Event-log record tying a healing result back to what fired it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingRecord {
    pub target: String,
    pub condition: String,
    pub action: ActionKind,
    /// The originating trigger's condition/threshold description.
    pub reason: String,
    pub result: HealingResult,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_out_of_bounds() {
        assert!(TriggerDirection::Above.out_of_bounds(0.85, 0.80));
        assert!(TriggerDirection::Above.out_of_bounds(0.80, 0.80));
        assert!(!TriggerDirection::Above.out_of_bounds(0.79, 0.80));

        assert!(TriggerDirection::Below.out_of_bounds(0.30, 0.40));
        assert!(!TriggerDirection::Below.out_of_bounds(0.50, 0.40));
    }

    #[test]
    fn test_trigger_description_includes_condition_and_threshold() {
        let trigger = HealingTrigger {
            target: "cpu".to_string(),
            condition: "cpu_usage".to_string(),
            threshold: 0.8,
            direction: TriggerDirection::Above,
            consecutive_failures: 2,
            action: ActionKind::Scale,
        };
        let desc = trigger.description();
        assert!(desc.contains("cpu_usage"));
        assert!(desc.contains("0.8"));
        assert!(desc.contains("2 consecutive"));
    }

    #[test]
    fn test_action_kind_serde_round_trip() {
        for kind in ActionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            let back: ActionKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
        assert_eq!(serde_json::to_string(&ActionKind::SwitchProvider).unwrap(), "\"switch_provider\"");
    }
}
