//! Self-healing: trigger evaluation with consecutive-failure debounce, and
//! corrective action execution.

pub mod context;
pub mod executor;
pub mod handlers;
pub mod triggers;

pub use context::{HealingContext, SharedHealingContext};
pub use executor::{ActionExecutor, ActionHandler, HandlerOutcome};
pub use handlers::simulated_handlers;
pub use triggers::TriggerEngine;
