//! Action Executor — dispatches fired triggers to registered handlers and
//! normalizes their outcomes.
//!
//! The executor owns the timing wrapper, the handler timeout, the post-action
//! counter reset, and the one-active-cycle guard. Handlers themselves are
//! opaque collaborators.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::storage::{append_or_warn, EventLog};
use crate::types::{ActionKind, FiredTrigger, HealingRecord, HealingResult};

use super::context::{self, SharedHealingContext};

/// Raw outcome returned by an action handler.
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    pub success: bool,
    pub detail: serde_json::Value,
    /// Handler's own estimate of this action's historical success rate.
    pub success_rate: Option<f64>,
}

/// One corrective action implementation.
///
/// Handlers may be long-running; the executor bounds them with a timeout and
/// measures wall-clock duration around the call.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn kind(&self) -> ActionKind;

    async fn run(&self, fired: &FiredTrigger) -> HandlerOutcome;
}

/// Dispatches fired triggers to handlers keyed by action kind.
pub struct ActionExecutor {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
    ctx: SharedHealingContext,
    log: Option<EventLog>,
    handler_timeout: Duration,
}

impl ActionExecutor {
    pub fn new(ctx: SharedHealingContext, log: Option<EventLog>, handler_timeout: Duration) -> Self {
        Self {
            handlers: HashMap::new(),
            ctx,
            log,
            handler_timeout,
        }
    }

    /// Register a handler for its action kind. Last registration wins.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn has_handler(&self, kind: ActionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Try to start a healing cycle.
    ///
    /// Returns false (a deliberate skip, not an error) when a previous
    /// cycle's triggers are still executing.
    pub fn try_begin_cycle(&self) -> bool {
        let started = context::lock(&self.ctx).try_begin_cycle();
        if !started {
            info!("Healing cycle already active, skipping this cycle");
        }
        started
    }

    /// Mark the current healing cycle finished.
    pub fn end_cycle(&self) {
        context::lock(&self.ctx).end_cycle();
    }

    /// Execute the action for one fired trigger.
    ///
    /// Regardless of outcome (success, handler failure, timeout, or missing
    /// handler) the (target, condition) counter resets to zero and one
    /// healing record is appended. The reset is the debounce: a fired action
    /// buys a full re-accumulation window before the same condition can fire
    /// again.
    pub async fn execute(&self, fired: &FiredTrigger) -> HealingResult {
        let trigger = &fired.trigger;

        let result = match self.handlers.get(&trigger.action) {
            None => {
                warn!(
                    action = %trigger.action,
                    target = trigger.target,
                    "No handler registered for action kind"
                );
                HealingResult {
                    success: false,
                    duration_ms: 0,
                    detail: serde_json::json!({
                        "error": format!("no handler registered for action '{}'", trigger.action),
                    }),
                    success_rate: None,
                }
            }
            Some(handler) => {
                let started = Instant::now();
                let outcome = tokio::time::timeout(self.handler_timeout, handler.run(fired)).await;
                let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

                match outcome {
                    Ok(outcome) => HealingResult {
                        success: outcome.success,
                        duration_ms,
                        detail: outcome.detail,
                        success_rate: outcome.success_rate,
                    },
                    Err(_) => {
                        warn!(
                            action = %trigger.action,
                            target = trigger.target,
                            timeout_secs = self.handler_timeout.as_secs(),
                            "Action handler timed out"
                        );
                        HealingResult {
                            success: false,
                            duration_ms,
                            detail: serde_json::json!({
                                "error": format!(
                                    "handler timed out after {}s",
                                    self.handler_timeout.as_secs()
                                ),
                            }),
                            success_rate: None,
                        }
                    }
                }
            }
        };

        // Fired actions always reset the counter, win or lose.
        context::lock(&self.ctx).reset(&trigger.target, &trigger.condition);

        let record = HealingRecord {
            target: trigger.target.clone(),
            condition: trigger.condition.clone(),
            action: trigger.action,
            reason: trigger.description(),
            result: result.clone(),
            timestamp: Utc::now(),
        };

        info!(
            target = record.target,
            action = %record.action,
            success = record.result.success,
            duration_ms = record.result.duration_ms,
            "Healing action executed"
        );

        append_or_warn(self.log.as_ref(), "healing_result", |log| log.append_healing(&record));

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::healing::context::shared_context;
    use crate::types::{HealingTrigger, TriggerDirection};

    struct FixedHandler {
        kind: ActionKind,
        success: bool,
        delay: Duration,
    }

    #[async_trait]
    impl ActionHandler for FixedHandler {
        fn kind(&self) -> ActionKind {
            self.kind
        }

        async fn run(&self, _fired: &FiredTrigger) -> HandlerOutcome {
            tokio::time::sleep(self.delay).await;
            HandlerOutcome {
                success: self.success,
                detail: serde_json::json!({"handler": "fixed"}),
                success_rate: Some(0.9),
            }
        }
    }

    fn fired(action: ActionKind) -> FiredTrigger {
        FiredTrigger {
            trigger: HealingTrigger {
                target: "cpu".to_string(),
                condition: "cpu_usage".to_string(),
                threshold: 0.8,
                direction: TriggerDirection::Above,
                consecutive_failures: 2,
                action,
            },
            observed: 0.85,
            streak: 2,
            fired_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_execute_resets_counter_on_success() {
        let ctx = shared_context();
        context::lock(&ctx).record_breach("cpu", "cpu_usage");
        context::lock(&ctx).record_breach("cpu", "cpu_usage");

        let mut executor = ActionExecutor::new(ctx.clone(), None, Duration::from_secs(5));
        executor.register(Arc::new(FixedHandler {
            kind: ActionKind::Scale,
            success: true,
            delay: Duration::from_millis(1),
        }));

        let result = executor.execute(&fired(ActionKind::Scale)).await;
        assert!(result.success);
        assert_eq!(context::lock(&ctx).streak("cpu", "cpu_usage"), 0);
    }

    #[tokio::test]
    async fn test_execute_resets_counter_on_failure() {
        let ctx = shared_context();
        context::lock(&ctx).record_breach("cpu", "cpu_usage");

        let mut executor = ActionExecutor::new(ctx.clone(), None, Duration::from_secs(5));
        executor.register(Arc::new(FixedHandler {
            kind: ActionKind::Scale,
            success: false,
            delay: Duration::from_millis(1),
        }));

        let result = executor.execute(&fired(ActionKind::Scale)).await;
        assert!(!result.success);
        assert_eq!(context::lock(&ctx).streak("cpu", "cpu_usage"), 0);
    }

    #[tokio::test]
    async fn test_unknown_action_kind_fails_without_handler_call() {
        let ctx = shared_context();
        context::lock(&ctx).record_breach("cpu", "cpu_usage");

        let executor = ActionExecutor::new(ctx.clone(), None, Duration::from_secs(5));
        let result = executor.execute(&fired(ActionKind::Retrain)).await;

        assert!(!result.success);
        assert_eq!(result.duration_ms, 0);
        assert!(result.detail["error"].as_str().unwrap().contains("no handler"));
        // Counter still resets.
        assert_eq!(context::lock(&ctx).streak("cpu", "cpu_usage"), 0);
    }

    #[tokio::test]
    async fn test_handler_timeout_marks_failure() {
        let ctx = shared_context();
        let mut executor = ActionExecutor::new(ctx.clone(), None, Duration::from_millis(20));
        executor.register(Arc::new(FixedHandler {
            kind: ActionKind::Restart,
            success: true,
            delay: Duration::from_secs(60),
        }));

        let result = executor.execute(&fired(ActionKind::Restart)).await;
        assert!(!result.success);
        assert!(result.detail["error"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_cycle_guard_skips_concurrent_start() {
        let ctx = shared_context();
        let executor = ActionExecutor::new(ctx, None, Duration::from_secs(5));

        assert!(executor.try_begin_cycle());
        assert!(!executor.try_begin_cycle());
        executor.end_cycle();
        assert!(executor.try_begin_cycle());
    }

    #[tokio::test]
    async fn test_duration_measured_around_handler() {
        let ctx = shared_context();
        let mut executor = ActionExecutor::new(ctx, None, Duration::from_secs(5));
        executor.register(Arc::new(FixedHandler {
            kind: ActionKind::Cleanup,
            success: true,
            delay: Duration::from_millis(30),
        }));

        let result = executor.execute(&fired(ActionKind::Cleanup)).await;
        assert!(result.duration_ms >= 30);
    }
}
