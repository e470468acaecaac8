//! Simulated action handlers.
//!
//! One handler per action kind, each sleeping for a plausible work duration
//! and returning a structured detail payload. Production deployments replace
//! these with real implementations of [`ActionHandler`]; the executor does
//! not change.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{ActionKind, FiredTrigger};

use super::executor::{ActionHandler, HandlerOutcome};

/// Sleep-and-report handler used for demo and soak runs.
pub struct SimulatedHandler {
    kind: ActionKind,
    base_delay: Duration,
    /// Probability that a run reports failure.
    failure_chance: f64,
}

impl SimulatedHandler {
    pub fn new(kind: ActionKind, base_delay: Duration, failure_chance: f64) -> Self {
        Self { kind, base_delay, failure_chance }
    }

    fn detail_for(&self, fired: &FiredTrigger) -> serde_json::Value {
        match self.kind {
            ActionKind::Scale => serde_json::json!({
                "replicas_added": 1,
                "target": fired.trigger.target,
            }),
            ActionKind::Restart => serde_json::json!({
                "restarted": fired.trigger.target,
                "graceful": true,
            }),
            ActionKind::SwitchProvider => serde_json::json!({
                "previous": "primary",
                "now": "secondary",
            }),
            ActionKind::AdjustParameters => serde_json::json!({
                "adjusted": ["batch_size", "worker_count"],
                "target": fired.trigger.target,
            }),
            ActionKind::Cleanup => serde_json::json!({
                "freed_mb": 512,
                "target": fired.trigger.target,
            }),
            ActionKind::Optimize => serde_json::json!({
                "pass": "index_rebuild",
                "target": fired.trigger.target,
            }),
            ActionKind::Retrain => serde_json::json!({
                "model": fired.trigger.target,
                "epochs": 3,
            }),
            ActionKind::EnableBackup => serde_json::json!({
                "standby_promoted": true,
                "target": fired.trigger.target,
            }),
        }
    }
}

#[async_trait]
impl ActionHandler for SimulatedHandler {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    async fn run(&self, fired: &FiredTrigger) -> HandlerOutcome {
        // Draw randomness before the await; Rng handles are not Send.
        let (jitter_ms, success, success_rate) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(0..250u64),
                !rng.gen_bool(self.failure_chance),
                rng.gen_range(0.70..0.98),
            )
        };

        tokio::time::sleep(self.base_delay + Duration::from_millis(jitter_ms)).await;

        let detail = if success {
            self.detail_for(fired)
        } else {
            serde_json::json!({
                "error": format!("simulated {} failure", self.kind),
                "target": fired.trigger.target,
            })
        };

        HandlerOutcome {
            success,
            detail,
            success_rate: Some(success_rate),
        }
    }
}

/// Simulated work duration per action kind.
fn base_delay(kind: ActionKind) -> Duration {
    match kind {
        ActionKind::Scale => Duration::from_secs(2),
        ActionKind::Restart => Duration::from_secs(3),
        ActionKind::SwitchProvider => Duration::from_secs(1),
        ActionKind::AdjustParameters => Duration::from_millis(500),
        ActionKind::Cleanup => Duration::from_secs(1),
        ActionKind::Optimize => Duration::from_secs(2),
        ActionKind::Retrain => Duration::from_secs(5),
        ActionKind::EnableBackup => Duration::from_secs(1),
    }
}

/// Build one simulated handler per action kind.
pub fn simulated_handlers(failure_chance: f64) -> Vec<Arc<dyn ActionHandler>> {
    ActionKind::ALL
        .into_iter()
        .map(|kind| {
            Arc::new(SimulatedHandler::new(kind, base_delay(kind), failure_chance))
                as Arc<dyn ActionHandler>
        })
        .collect()
}
