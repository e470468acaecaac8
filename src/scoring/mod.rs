//! State scoring: cycle counters -> system status and quota budget.

pub mod priority;
pub mod scorer;

pub use priority::current_priority;
pub use scorer::{score, CycleCounters};
