//! Periodic monitoring cycle driver.
//!
//! Owns the evaluation pipeline end to end. Metric fetches are issued
//! concurrently across components (independent reads); trigger counters and
//! the active-healing guard live behind the shared healing context; fired
//! actions run in a spawned task so handlers never block evaluation.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::healing::{ActionExecutor, TriggerEngine};
use crate::monitor::{aggregate, HealthEvaluator, MetricsProvider};
use crate::scoring::{current_priority, scorer};
use crate::storage::{append_or_warn, EventLog};
use crate::types::{HealingTrigger, MetricMap, SystemState, SystemStatus};

use super::state::AppState;

/// The periodic health-monitoring and self-healing loop.
pub struct MonitorLoop {
    components: Vec<String>,
    triggers: Vec<HealingTrigger>,
    provider: Arc<dyn MetricsProvider>,
    evaluator: Arc<HealthEvaluator>,
    trigger_engine: TriggerEngine,
    executor: Arc<ActionExecutor>,
    app_state: Arc<RwLock<AppState>>,
    log: Option<EventLog>,
    interval: Duration,
    cycle_warn_ms: u64,
    auto_commit: bool,
    cancel: CancellationToken,
}

impl MonitorLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        components: Vec<String>,
        triggers: Vec<HealingTrigger>,
        provider: Arc<dyn MetricsProvider>,
        evaluator: Arc<HealthEvaluator>,
        trigger_engine: TriggerEngine,
        executor: Arc<ActionExecutor>,
        app_state: Arc<RwLock<AppState>>,
        log: Option<EventLog>,
        interval: Duration,
        cycle_warn_ms: u64,
        auto_commit: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            components,
            triggers,
            provider,
            evaluator,
            trigger_engine,
            executor,
            app_state,
            log,
            interval,
            cycle_warn_ms,
            auto_commit,
            cancel,
        }
    }

    /// Run the monitoring loop until cancellation.
    pub async fn run(self) {
        info!(
            components = self.components.len(),
            triggers = self.triggers.len(),
            interval_secs = self.interval.as_secs(),
            "Monitor loop started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("[MonitorLoop] Shutdown signal received");
                    return;
                }
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// Run one complete monitoring cycle.
    pub async fn run_cycle(&self) {
        let cycle_started = Instant::now();

        // Metric acquisition: independent reads, issued concurrently.
        let fetches = self.components.iter().map(|name| {
            let provider = Arc::clone(&self.provider);
            let name = name.clone();
            async move {
                let started = Instant::now();
                let metrics = provider.get_metrics(&name).await;
                (name, metrics, started)
            }
        });
        let snapshots = futures::future::join_all(fetches).await;

        // Evaluation sees the same snapshot the trigger engine will.
        let mut metrics_by_component: HashMap<String, MetricMap> = HashMap::new();
        let mut results = Vec::with_capacity(snapshots.len());
        for (name, metrics, started) in snapshots {
            if let Ok(ref m) = metrics {
                metrics_by_component.insert(name.clone(), m.clone());
            }
            results.push(self.evaluator.evaluate_snapshot(&name, metrics, started));
        }

        let overall = aggregate(&results);

        // Trigger evaluation under the shared context.
        let fired = self.trigger_engine.evaluate(&self.triggers, &metrics_by_component);

        if !fired.is_empty() && self.executor.try_begin_cycle() {
            info!(fired = fired.len(), "Healing cycle starting");
            let executor = Arc::clone(&self.executor);
            let app_state = Arc::clone(&self.app_state);
            tokio::spawn(async move {
                for f in fired {
                    let result = executor.execute(&f).await;
                    app_state.write().await.record_heal(result.success);
                }
                executor.end_cycle();
            });
        }

        // Scoring and snapshot at the cycle boundary.
        let cycle_ms = u64::try_from(cycle_started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let priority = current_priority(Utc::now().date_naive());

        let snapshot = {
            let mut state = self.app_state.write().await;
            state.cycle_count += 1;
            state.last_cycle_ms = cycle_ms;
            state.overall = Some(overall.clone());
            state.latest_results = results;

            let counters = scorer::CycleCounters {
                heals_attempted: state.heals_attempted,
                heals_succeeded: state.heals_succeeded,
                consecutive_heal_failures: state.consecutive_heal_failures,
                uptime: state.started_at.elapsed(),
                opportunities_found: state.throughput.opportunities_found,
                last_cycle: Duration::from_millis(cycle_ms),
                auto_commit: self.auto_commit,
                quota: state.quota,
            };
            let score = scorer::health_score(&counters);
            let status = SystemStatus::from_score(score);
            let quota = scorer::quota_budget(status, priority);

            state.status = status;
            state.quota = quota;
            state.priority = priority;

            let snapshot = SystemState {
                cycle: state.cycle_count,
                status,
                score,
                heals_attempted: state.heals_attempted,
                heals_succeeded: state.heals_succeeded,
                consecutive_heal_failures: state.consecutive_heal_failures,
                priority,
                quota,
                uptime_secs: state.uptime_secs(),
                throughput: state.throughput.clone(),
                last_cycle_ms: cycle_ms,
                timestamp: Utc::now(),
            };
            state.latest_snapshot = Some(snapshot.clone());
            snapshot
        };

        append_or_warn(self.log.as_ref(), "state_snapshot", |log| {
            log.append_snapshot(&snapshot)
        });

        if cycle_ms > self.cycle_warn_ms {
            warn!(cycle_ms, "Monitoring cycle ran slow");
        }

        info!(
            cycle = snapshot.cycle,
            overall = %overall.status,
            score = snapshot.score,
            status = %snapshot.status,
            quota = snapshot.quota,
            priority = %snapshot.priority,
            cycle_ms,
            "Cycle complete"
        );
    }
}
