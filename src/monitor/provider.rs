//! Metrics provider seam.
//!
//! The control loop consumes measurements; it does not collect them. Anything
//! that can answer "what are this component's numbers right now" plugs in
//! here: an agent scraping the process table, a metrics gateway client, or
//! the simulated provider in [`sim`](super::sim).

use async_trait::async_trait;

use crate::types::MetricMap;

/// Error from a metrics source.
///
/// These never propagate out of an evaluation: the evaluator folds them into
/// an `Error`-status result.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("metrics source unreachable: {0}")]
    Unreachable(String),

    #[error("malformed metrics payload: {0}")]
    Malformed(String),

    #[error("unknown component: {0}")]
    UnknownComponent(String),
}

/// Source of live measurements for named components.
///
/// Fails closed: absence of an expected field in a returned snapshot is not
/// an error; it reads as "no matching alias" downstream.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn get_metrics(&self, component: &str) -> Result<MetricMap, ProviderError>;
}
