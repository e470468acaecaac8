//! Simulated and scripted metrics providers.
//!
//! `SimulatedProvider` drives demo runs: plausible noisy values per component
//! with an occasional degradation episode so triggers actually fire.
//! `ScriptedProvider` replays fixed per-cycle snapshots for tests.

use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::types::MetricMap;

use super::provider::{MetricsProvider, ProviderError};

// ============================================================================
// Simulated Provider
// ============================================================================

/// Random-walk metrics generator for demo and soak runs.
///
/// Each component gets values near a healthy baseline; with `degrade_chance`
/// probability per call, a component enters a degradation episode for a few
/// cycles, pushing its values past warning/critical territory.
pub struct SimulatedProvider {
    /// Probability per call that a healthy component starts degrading.
    degrade_chance: f64,
    /// Remaining degraded cycles per component.
    episodes: Mutex<HashMap<String, u32>>,
}

impl SimulatedProvider {
    pub fn new(degrade_chance: f64) -> Self {
        Self {
            degrade_chance,
            episodes: Mutex::new(HashMap::new()),
        }
    }

    /// Whether this call should produce degraded values for `component`.
    fn degraded(&self, component: &str) -> bool {
        let mut rng = rand::thread_rng();
        let mut episodes = self.episodes.lock().unwrap_or_else(|e| e.into_inner());

        match episodes.get_mut(component) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => {
                if rng.gen_bool(self.degrade_chance) {
                    episodes.insert(component.to_string(), rng.gen_range(2..6));
                    true
                } else {
                    false
                }
            }
        }
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(0.05)
    }
}

#[async_trait]
impl MetricsProvider for SimulatedProvider {
    async fn get_metrics(&self, component: &str) -> Result<MetricMap, ProviderError> {
        let degraded = self.degraded(component);
        let mut rng = rand::thread_rng();
        let mut m = MetricMap::new();

        match component {
            "cpu" => {
                let usage = if degraded { rng.gen_range(0.82..0.99) } else { rng.gen_range(0.15..0.55) };
                m.insert("utilization".to_string(), usage);
                m.insert("cpu_usage".to_string(), usage);
            }
            "memory" => {
                let usage = if degraded { rng.gen_range(0.85..0.97) } else { rng.gen_range(0.30..0.55) };
                m.insert("utilization".to_string(), usage);
                m.insert("memory_usage".to_string(), usage);
            }
            "database" => {
                let latency = if degraded { rng.gen_range(600.0..1500.0) } else { rng.gen_range(20.0..180.0) };
                m.insert("response_time_ms".to_string(), latency);
                m.insert("error_rate".to_string(), if degraded { rng.gen_range(0.05..0.20) } else { rng.gen_range(0.0..0.005) });
                m.insert("connection_errors".to_string(), if degraded { rng.gen_range(3.0..12.0) } else { 0.0 });
                m.insert("availability".to_string(), if degraded { rng.gen_range(0.40..0.90) } else { 1.0 });
            }
            "api_client" => {
                m.insert("response_time_ms".to_string(), if degraded { rng.gen_range(1200.0..3000.0) } else { rng.gen_range(80.0..400.0) });
                m.insert("error_rate".to_string(), if degraded { rng.gen_range(0.20..0.50) } else { rng.gen_range(0.0..0.03) });
            }
            "cache" => {
                m.insert("hit_rate".to_string(), if degraded { rng.gen_range(0.20..0.55) } else { rng.gen_range(0.85..0.99) });
            }
            "pipeline" => {
                m.insert("queue_depth".to_string(), if degraded { rng.gen_range(600.0..2000.0) } else { rng.gen_range(0.0..80.0) });
            }
            "model_engine" => {
                m.insert("availability".to_string(), if degraded { rng.gen_range(0.80..0.94) } else { rng.gen_range(0.99..1.0) });
                m.insert("accuracy".to_string(), if degraded { rng.gen_range(0.40..0.58) } else { rng.gen_range(0.70..0.95) });
            }
            other => {
                return Err(ProviderError::UnknownComponent(other.to_string()));
            }
        }

        Ok(m)
    }
}

// ============================================================================
// Scripted Provider
// ============================================================================

/// Replays a fixed sequence of snapshots per component.
///
/// Each `get_metrics` call pops the next snapshot for that component; when a
/// component's script runs out, the last snapshot repeats. Used by
/// integration tests to drive deterministic multi-cycle scenarios.
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<MetricMap>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self { scripts: Mutex::new(HashMap::new()) }
    }

    /// Queue a sequence of snapshots for one component.
    pub fn script(&self, component: &str, snapshots: Vec<MetricMap>) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts.insert(component.to_string(), snapshots.into());
    }

    /// Convenience: queue single-field snapshots for one component.
    pub fn script_field(&self, component: &str, field: &str, values: &[f64]) {
        let snapshots = values
            .iter()
            .map(|v| {
                let mut m = MetricMap::new();
                m.insert(field.to_string(), *v);
                m
            })
            .collect();
        self.script(component, snapshots);
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsProvider for ScriptedProvider {
    async fn get_metrics(&self, component: &str) -> Result<MetricMap, ProviderError> {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        let queue = scripts
            .get_mut(component)
            .ok_or_else(|| ProviderError::UnknownComponent(component.to_string()))?;

        match queue.len() {
            0 => Err(ProviderError::Unreachable(format!("script exhausted for {component}"))),
            1 => Ok(queue.front().cloned().unwrap_or_default()),
            _ => Ok(queue.pop_front().unwrap_or_default()),
        }
    }
}
