//! API handlers: current health, state, history, and on-demand checks.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::defaults::{RECENT_LIMIT, RECENT_LIMIT_MAX};
use crate::monitor::{aggregate, HealthEvaluator};
use crate::pipeline::AppState;
use crate::storage::EventLog;
use crate::types::{
    HealthCheckResult, OverallHealth, PriorityMode, StatusBreakdown, SystemStatus, ThroughputWindow,
};

use super::envelope::{ApiErrorResponse, ApiResponse};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub app_state: Arc<RwLock<AppState>>,
    pub evaluator: Arc<HealthEvaluator>,
    /// Components eligible for on-demand checks.
    pub components: Vec<String>,
    pub log: Option<EventLog>,
}

// ============================================================================
// Current Health
// ============================================================================

/// GET /api/v1/health - Current aggregated health across all components.
pub async fn get_health(State(state): State<ApiState>) -> Response {
    let app_state = state.app_state.read().await;

    let overall: OverallHealth = match &app_state.overall {
        Some(overall) => overall.clone(),
        // No cycle has completed yet; aggregate whatever exists (empty
        // input yields the distinguished Unknown status).
        None => aggregate(&app_state.latest_results),
    };

    ApiResponse::ok(overall)
}

// ============================================================================
// System Status
// ============================================================================

/// System state response assembled from the running aggregate.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: SystemStatus,
    pub quota: i64,
    pub priority: PriorityMode,
    pub cycle_count: u64,
    pub heals_attempted: u64,
    pub heals_succeeded: u64,
    pub consecutive_heal_failures: u32,
    pub uptime_secs: u64,
    pub throughput: ThroughputWindow,
    pub last_cycle_ms: u64,
}

/// GET /api/v1/status - Current system status and quota.
pub async fn get_status(State(state): State<ApiState>) -> Response {
    let app_state = state.app_state.read().await;
    ApiResponse::ok(StatusResponse {
        status: app_state.status,
        quota: app_state.quota,
        priority: app_state.priority,
        cycle_count: app_state.cycle_count,
        heals_attempted: app_state.heals_attempted,
        heals_succeeded: app_state.heals_succeeded,
        consecutive_heal_failures: app_state.consecutive_heal_failures,
        uptime_secs: app_state.uptime_secs(),
        throughput: app_state.throughput.clone(),
        last_cycle_ms: app_state.last_cycle_ms,
    })
}

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<usize>,
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(RECENT_LIMIT).min(RECENT_LIMIT_MAX)
}

/// GET /api/v1/checks/recent - Most recent health checks, newest first.
pub async fn recent_checks(
    State(state): State<ApiState>,
    Query(params): Query<RecentParams>,
) -> Response {
    match &state.log {
        Some(log) => ApiResponse::ok(log.recent_checks(clamp_limit(params.limit))),
        None => ApiErrorResponse::service_unavailable("event log not available"),
    }
}

/// GET /api/v1/healing/recent - Most recent healing records, newest first.
pub async fn recent_healing(
    State(state): State<ApiState>,
    Query(params): Query<RecentParams>,
) -> Response {
    match &state.log {
        Some(log) => ApiResponse::ok(log.recent_healing(clamp_limit(params.limit))),
        None => ApiErrorResponse::service_unavailable("event log not available"),
    }
}

// ============================================================================
// Performance Window
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PerformanceParams {
    /// Window size in hours (default 24, max 720).
    pub hours: Option<i64>,
}

/// Aggregates over a trailing time window, computed from the event log.
#[derive(Debug, Serialize)]
pub struct PerformanceReport {
    pub window_hours: i64,
    pub checks_total: usize,
    pub mean_score: f64,
    pub breakdown: StatusBreakdown,
    pub heals_attempted: usize,
    pub heals_succeeded: usize,
    pub heal_success_rate: Option<f64>,
    pub mean_heal_duration_ms: Option<f64>,
}

/// GET /api/v1/performance - Windowed aggregates for dashboards.
pub async fn performance(
    State(state): State<ApiState>,
    Query(params): Query<PerformanceParams>,
) -> Response {
    let Some(log) = &state.log else {
        return ApiErrorResponse::service_unavailable("event log not available");
    };

    let hours = params.hours.unwrap_or(24).clamp(1, 720);
    let end = Utc::now();
    let start = end - Duration::hours(hours);

    let checks = log.checks_in_range(start, end);
    let healing = log.healing_in_range(start, end);

    let mut breakdown = StatusBreakdown::default();
    let mut score_sum = 0.0;
    for check in &checks {
        breakdown.record(check.status);
        score_sum += check.score;
    }
    let mean_score = if checks.is_empty() { 0.0 } else { score_sum / checks.len() as f64 };

    let heals_succeeded = healing.iter().filter(|h| h.result.success).count();
    let heal_success_rate = if healing.is_empty() {
        None
    } else {
        Some(heals_succeeded as f64 / healing.len() as f64)
    };
    let mean_heal_duration_ms = if healing.is_empty() {
        None
    } else {
        Some(healing.iter().map(|h| h.result.duration_ms as f64).sum::<f64>() / healing.len() as f64)
    };

    ApiResponse::ok(PerformanceReport {
        window_hours: hours,
        checks_total: checks.len(),
        mean_score,
        breakdown,
        heals_attempted: healing.len(),
        heals_succeeded,
        heal_success_rate,
        mean_heal_duration_ms,
    })
}

// ============================================================================
// On-Demand Checks
// ============================================================================

/// POST /api/v1/checks/:component - Run one component's check now.
pub async fn run_check(
    State(state): State<ApiState>,
    Path(component): Path<String>,
) -> Response {
    if !state.components.contains(&component) {
        return ApiErrorResponse::not_found(format!("unknown component '{component}'"));
    }

    let result = state.evaluator.evaluate(&component).await;

    {
        let mut app_state = state.app_state.write().await;
        merge_result(&mut app_state.latest_results, result.clone());
        app_state.overall = Some(aggregate(&app_state.latest_results));
    }

    ApiResponse::ok(result)
}

/// Response for a check-all request.
#[derive(Debug, Serialize)]
pub struct CheckAllResponse {
    pub overall: OverallHealth,
    pub results: Vec<HealthCheckResult>,
}

/// POST /api/v1/checks - Run all components' checks now.
pub async fn run_all_checks(State(state): State<ApiState>) -> Response {
    let futures = state
        .components
        .iter()
        .map(|component| state.evaluator.evaluate(component));
    let results = futures::future::join_all(futures).await;
    let overall = aggregate(&results);

    {
        let mut app_state = state.app_state.write().await;
        app_state.latest_results = results.clone();
        app_state.overall = Some(overall.clone());
    }

    ApiResponse::ok(CheckAllResponse { overall, results })
}

/// Replace the stored result for one component, appending if absent.
fn merge_result(results: &mut Vec<HealthCheckResult>, result: HealthCheckResult) {
    match results.iter_mut().find(|r| r.component == result.component) {
        Some(existing) => *existing = result,
        None => results.push(result),
    }
}

// ============================================================================
// Legacy Liveness
// ============================================================================

/// Legacy health check response.
#[derive(Debug, Serialize)]
pub struct LegacyHealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// GET /health - Legacy liveness check.
pub async fn legacy_health_check(State(state): State<ApiState>) -> Json<LegacyHealthResponse> {
    let app_state = state.app_state.read().await;
    Json(LegacyHealthResponse {
        status: app_state.status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: app_state.uptime_secs(),
    })
}
