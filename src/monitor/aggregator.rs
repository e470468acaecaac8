//! Status Aggregator — folds per-component checks into one system status.

use chrono::Utc;
use std::collections::BTreeMap;

use crate::types::{ComponentDetail, HealthCheckResult, HealthStatus, OverallHealth, StatusBreakdown};

/// Combine component check results into a system-wide status.
///
/// Overall status is the worst status among the results; overall score is the
/// arithmetic mean. An empty input yields the distinguished `Unknown` status
/// rather than defaulting to Healthy.
pub fn aggregate(results: &[HealthCheckResult]) -> OverallHealth {
    if results.is_empty() {
        return OverallHealth {
            status: HealthStatus::Unknown,
            score: 0.0,
            breakdown: StatusBreakdown::default(),
            components: BTreeMap::new(),
            timestamp: Utc::now(),
        };
    }

    let mut status = HealthStatus::Healthy;
    let mut breakdown = StatusBreakdown::default();
    let mut components = BTreeMap::new();
    let mut score_sum = 0.0;

    for result in results {
        status = status.worst(result.status);
        breakdown.record(result.status);
        score_sum += result.score;
        components.insert(
            result.component.clone(),
            ComponentDetail {
                status: result.status,
                score: result.score,
                message: result.message.clone(),
            },
        );
    }

    OverallHealth {
        status,
        score: score_sum / results.len() as f64,
        breakdown,
        components,
        timestamp: Utc::now(),
    }
}
