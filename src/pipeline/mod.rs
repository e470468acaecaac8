//! Control loop driver.
//!
//! One cycle every interval:
//!
//! ```text
//! PHASE 1: Metric acquisition (all components, concurrent)
//! PHASE 2: Per-component health evaluation
//! PHASE 3: System-wide aggregation
//! PHASE 4: Trigger evaluation (debounce counters, shared context)
//! PHASE 5: Healing dispatch (spawned task, one active cycle at a time)
//! PHASE 6: Scoring + immutable state snapshot
//! ```
//!
//! Healing never blocks evaluation: fired actions run in their own task and
//! the active-cycle guard is the only cross-cycle serialization point.

mod monitor_loop;
mod state;

pub use monitor_loop::MonitorLoop;
pub use state::AppState;
