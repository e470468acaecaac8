//! Trigger Engine — matches live metrics against healing-trigger definitions
//! with consecutive-failure debounce.

use chrono::Utc;
use std::collections::HashMap;

use crate::types::{FiredTrigger, HealingTrigger, MetricMap};

use super::context::{self, SharedHealingContext};

/// Evaluates the trigger set against current metrics.
///
/// Pure over the supplied metrics plus the shared counter state; performs no
/// I/O. Firing decisions are debounced: a trigger with
/// `consecutive_failures = k` fires only once the condition has been out of
/// bounds for k cycles in a row.
pub struct TriggerEngine {
    ctx: SharedHealingContext,
}

impl TriggerEngine {
    pub fn new(ctx: SharedHealingContext) -> Self {
        Self { ctx }
    }

    /// Evaluate all triggers against one cycle's metrics.
    ///
    /// `metrics` maps component name to its snapshot for this cycle. A
    /// condition whose field is absent from the snapshot cannot be judged and
    /// leaves its counter untouched. Returns fired triggers ordered by target,
    /// then configured threshold ascending.
    pub fn evaluate(
        &self,
        triggers: &[HealingTrigger],
        metrics: &HashMap<String, MetricMap>,
    ) -> Vec<FiredTrigger> {
        let mut ctx = context::lock(&self.ctx);
        let mut fired = Vec::new();

        for trigger in triggers {
            let Some(value) = metrics
                .get(&trigger.target)
                .and_then(|m| m.get(&trigger.condition))
                .copied()
            else {
                continue;
            };

            if trigger.direction.out_of_bounds(value, trigger.threshold) {
                let streak = ctx.record_breach(&trigger.target, &trigger.condition);
                if streak >= trigger.consecutive_failures {
                    fired.push(FiredTrigger {
                        trigger: trigger.clone(),
                        observed: value,
                        streak,
                        fired_at: Utc::now(),
                    });
                }
            } else {
                ctx.record_recovery(&trigger.target, &trigger.condition);
            }
        }

        fired.sort_by(|a, b| {
            a.trigger
                .target
                .cmp(&b.trigger.target)
                .then(a.trigger.threshold.total_cmp(&b.trigger.threshold))
        });
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::healing::context::shared_context;
    use crate::types::{ActionKind, TriggerDirection};

    fn cpu_trigger(threshold: f64, consecutive: u32, action: ActionKind) -> HealingTrigger {
        HealingTrigger {
            target: "cpu".to_string(),
            condition: "cpu_usage".to_string(),
            threshold,
            direction: TriggerDirection::Above,
            consecutive_failures: consecutive,
            action,
        }
    }

    fn cycle_metrics(value: f64) -> HashMap<String, MetricMap> {
        let mut snapshot = MetricMap::new();
        snapshot.insert("cpu_usage".to_string(), value);
        let mut m = HashMap::new();
        m.insert("cpu".to_string(), snapshot);
        m
    }

    #[test]
    fn test_debounce_fires_on_kth_consecutive_cycle() {
        let engine = TriggerEngine::new(shared_context());
        let triggers = vec![cpu_trigger(0.80, 2, ActionKind::Scale)];

        // Cycle 1: out of bounds but streak 1 < 2, no fire.
        assert!(engine.evaluate(&triggers, &cycle_metrics(0.85)).is_empty());
        // Cycle 2: streak 2, fires.
        let fired = engine.evaluate(&triggers, &cycle_metrics(0.85));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].streak, 2);
        // Cycle 3: back in bounds. Counter resets, no fire.
        assert!(engine.evaluate(&triggers, &cycle_metrics(0.40)).is_empty());
    }

    #[test]
    fn test_in_bounds_cycle_resets_streak() {
        let ctx = shared_context();
        let engine = TriggerEngine::new(ctx.clone());
        let triggers = vec![cpu_trigger(0.80, 3, ActionKind::Scale)];

        engine.evaluate(&triggers, &cycle_metrics(0.85));
        engine.evaluate(&triggers, &cycle_metrics(0.85));
        // Interposed in-bounds cycle resets to 0.
        engine.evaluate(&triggers, &cycle_metrics(0.10));
        assert_eq!(context::lock(&ctx).streak("cpu", "cpu_usage"), 0);

        // Two more breaches still short of 3, no fire.
        engine.evaluate(&triggers, &cycle_metrics(0.85));
        assert!(engine.evaluate(&triggers, &cycle_metrics(0.85)).is_empty());
    }

    #[test]
    fn test_multiple_triggers_same_target_fire_independently() {
        let engine = TriggerEngine::new(shared_context());
        let triggers = vec![
            cpu_trigger(0.95, 1, ActionKind::Restart),
            cpu_trigger(0.80, 1, ActionKind::Scale),
        ];

        let fired = engine.evaluate(&triggers, &cycle_metrics(0.97));
        assert_eq!(fired.len(), 2);
        // Ordered by threshold ascending.
        assert_eq!(fired[0].trigger.action, ActionKind::Scale);
        assert_eq!(fired[1].trigger.action, ActionKind::Restart);
    }

    #[test]
    fn test_below_direction() {
        let engine = TriggerEngine::new(shared_context());
        let triggers = vec![HealingTrigger {
            target: "cache".to_string(),
            condition: "hit_rate".to_string(),
            threshold: 0.40,
            direction: TriggerDirection::Below,
            consecutive_failures: 1,
            action: ActionKind::Optimize,
        }];

        let mut snapshot = MetricMap::new();
        snapshot.insert("hit_rate".to_string(), 0.30);
        let mut metrics = HashMap::new();
        metrics.insert("cache".to_string(), snapshot);

        assert_eq!(engine.evaluate(&triggers, &metrics).len(), 1);
    }

    #[test]
    fn test_absent_condition_leaves_counter_untouched() {
        let ctx = shared_context();
        let engine = TriggerEngine::new(ctx.clone());
        let triggers = vec![cpu_trigger(0.80, 2, ActionKind::Scale)];

        engine.evaluate(&triggers, &cycle_metrics(0.85));
        assert_eq!(context::lock(&ctx).streak("cpu", "cpu_usage"), 1);

        // Snapshot without the condition field: neither breach nor recovery.
        let mut metrics = HashMap::new();
        metrics.insert("cpu".to_string(), MetricMap::new());
        engine.evaluate(&triggers, &metrics);
        assert_eq!(context::lock(&ctx).streak("cpu", "cpu_usage"), 1);
    }
}
