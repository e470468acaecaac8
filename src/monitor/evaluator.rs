//! Health Evaluator — scores one component's metrics against its thresholds.
//!
//! Every invocation produces exactly one [`HealthCheckResult`] and appends it
//! to the event log. The call never fails: provider errors, missing fields,
//! and unconfigured components are all encoded in the returned result.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::storage::{append_or_warn, EventLog};
use crate::types::{HealthCheckResult, HealthStatus, MetricMap, Threshold};

use super::provider::{MetricsProvider, ProviderError};

/// Evaluates component health against the static threshold table.
pub struct HealthEvaluator {
    thresholds: Vec<Threshold>,
    provider: Arc<dyn MetricsProvider>,
    log: Option<EventLog>,
}

impl HealthEvaluator {
    pub fn new(
        thresholds: Vec<Threshold>,
        provider: Arc<dyn MetricsProvider>,
        log: Option<EventLog>,
    ) -> Self {
        Self { thresholds, provider, log }
    }

    /// Fetch metrics from the provider and evaluate one component.
    pub async fn evaluate(&self, component: &str) -> HealthCheckResult {
        let started = Instant::now();
        let metrics = self.provider.get_metrics(component).await;
        self.evaluate_snapshot(component, metrics, started)
    }

    /// Evaluate one component against an already-fetched snapshot.
    ///
    /// The monitor loop fetches each component's metrics once per cycle and
    /// shares the snapshot between this evaluator and the trigger engine, so
    /// both see the same values.
    pub fn evaluate_snapshot(
        &self,
        component: &str,
        metrics: Result<MetricMap, ProviderError>,
        started: Instant,
    ) -> HealthCheckResult {
        let result = match metrics {
            Err(e) => self.failed_result(component, &e, started),
            Ok(metrics) => self.score_metrics(component, &metrics, started),
        };

        debug!(
            component = result.component,
            status = %result.status,
            score = result.score,
            "Health check complete"
        );

        append_or_warn(self.log.as_ref(), "health_check", |log| log.append_check(&result));

        result
    }

    /// Rows of the threshold table matching one component.
    fn rows_for(&self, component: &str) -> Vec<&Threshold> {
        self.thresholds.iter().filter(|t| t.component == component).collect()
    }

    /// Provider failure: Error status, cause in the message.
    fn failed_result(&self, component: &str, error: &ProviderError, started: Instant) -> HealthCheckResult {
        HealthCheckResult {
            component: component.to_string(),
            status: HealthStatus::Error,
            message: format!("metrics provider failed: {error}"),
            score: 0.0,
            response_time_ms: elapsed_ms(started),
            error_count: 1,
            timestamp: Utc::now(),
        }
    }

    /// Classify each matched threshold; worst status and minimum score win.
    fn score_metrics(&self, component: &str, metrics: &MetricMap, started: Instant) -> HealthCheckResult {
        let rows = self.rows_for(component);

        if rows.is_empty() {
            // Explicit "unconfigured" signal rather than silently Healthy.
            return HealthCheckResult {
                component: component.to_string(),
                status: HealthStatus::Warning,
                message: format!("no thresholds configured for component '{component}'"),
                score: 0.5,
                response_time_ms: elapsed_ms(started),
                error_count: 0,
                timestamp: Utc::now(),
            };
        }

        let mut status = HealthStatus::Healthy;
        let mut score = f64::INFINITY;
        let mut error_count = 0u32;
        let mut findings: Vec<String> = Vec::new();
        let mut matched = 0usize;

        for row in &rows {
            let Some(value) = row.metric.extract(metrics) else {
                // Absent field: no matching alias, not an error.
                continue;
            };
            matched += 1;

            let verdict = row.classify(value);
            status = status.worst(verdict.status);
            score = score.min(verdict.score);

            if verdict.status == HealthStatus::Error {
                error_count += 1;
            }
            if verdict.tier != "ok" {
                findings.push(format!(
                    "{} {:.3} crossed {} limit {:.3}",
                    row.metric,
                    value,
                    verdict.tier,
                    match verdict.tier {
                        "error" => row.error,
                        "critical" => row.critical,
                        _ => row.warning,
                    }
                ));
            }
        }

        if matched == 0 {
            return HealthCheckResult {
                component: component.to_string(),
                status: HealthStatus::Error,
                message: format!(
                    "metrics snapshot for '{component}' contained no usable fields ({} thresholds configured)",
                    rows.len()
                ),
                score: 0.0,
                response_time_ms: elapsed_ms(started),
                error_count: 1,
                timestamp: Utc::now(),
            };
        }

        let message = if findings.is_empty() {
            format!("all {matched} thresholds within limits")
        } else {
            findings.join("; ")
        };

        HealthCheckResult {
            component: component.to_string(),
            status,
            message,
            score,
            response_time_ms: elapsed_ms(started),
            error_count,
            timestamp: Utc::now(),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::sim::ScriptedProvider;
    use crate::types::MetricKind;

    fn evaluator(thresholds: Vec<Threshold>, provider: ScriptedProvider) -> HealthEvaluator {
        HealthEvaluator::new(thresholds, Arc::new(provider), None)
    }

    fn memory_thresholds() -> Vec<Threshold> {
        vec![Threshold {
            component: "memory".to_string(),
            metric: MetricKind::Utilization,
            warning: 0.60,
            critical: 0.80,
            error: 0.90,
        }]
    }

    #[tokio::test]
    async fn test_error_tier_crossing() {
        // memory at 0.96 against (0.60, 0.80, 0.90) reads as failed.
        let provider = ScriptedProvider::new();
        provider.script_field("memory", "utilization", &[0.96]);

        let result = evaluator(memory_thresholds(), provider).evaluate("memory").await;
        assert_eq!(result.status, HealthStatus::Error);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.error_count, 1);
    }

    #[tokio::test]
    async fn test_unconfigured_component_is_warning_half_score() {
        let provider = ScriptedProvider::new();
        provider.script_field("ghost", "utilization", &[0.10]);

        let result = evaluator(memory_thresholds(), provider).evaluate("ghost").await;
        assert_eq!(result.status, HealthStatus::Warning);
        assert_eq!(result.score, 0.5);
        assert!(result.message.contains("no thresholds configured"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_error_result_not_panic() {
        let provider = ScriptedProvider::new();
        // No script for "memory" -> UnknownComponent error from the provider.
        let result = evaluator(memory_thresholds(), provider).evaluate("memory").await;
        assert_eq!(result.status, HealthStatus::Error);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.error_count, 1);
        assert!(result.message.contains("metrics provider failed"));
    }

    #[tokio::test]
    async fn test_no_usable_fields_is_error() {
        let provider = ScriptedProvider::new();
        provider.script_field("memory", "unrelated_field", &[1.0]);

        let result = evaluator(memory_thresholds(), provider).evaluate("memory").await;
        assert_eq!(result.status, HealthStatus::Error);
        assert!(result.message.contains("no usable fields"));
    }

    #[tokio::test]
    async fn test_worst_status_and_min_score_across_thresholds() {
        let thresholds = vec![
            Threshold {
                component: "database".to_string(),
                metric: MetricKind::ResponseTime,
                warning: 250.0,
                critical: 500.0,
                error: 1000.0,
            },
            Threshold {
                component: "database".to_string(),
                metric: MetricKind::ErrorRate,
                warning: 0.01,
                critical: 0.05,
                error: 0.10,
            },
        ];

        let provider = ScriptedProvider::new();
        let mut snapshot = MetricMap::new();
        snapshot.insert("response_time_ms".to_string(), 100.0); // healthy
        snapshot.insert("error_rate".to_string(), 0.06); // critical tier
        provider.script("database", vec![snapshot]);

        let result = evaluator(thresholds, provider).evaluate("database").await;
        assert_eq!(result.status, HealthStatus::Warning);
        assert_eq!(result.score, 0.3);
    }

    #[tokio::test]
    async fn test_score_monotonic_in_measured_value() {
        let values = [0.10, 0.59, 0.61, 0.79, 0.81, 0.89, 0.91, 0.99];
        let mut last = f64::INFINITY;
        for value in values {
            let provider = ScriptedProvider::new();
            provider.script_field("memory", "utilization", &[value]);
            let result = evaluator(memory_thresholds(), provider).evaluate("memory").await;
            assert!(result.score <= last, "score increased at {}", value);
            last = result.score;
        }
    }
}
