//! Shared healing state: debounce counters and the active-cycle guard.
//!
//! Owned by the driver and injected into the trigger engine and the action
//! executor, replacing any notion of process-global mutable state. All access
//! goes through one mutex; the lock is never held across an await point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Counter key: (target component, condition name).
pub type CounterKey = (String, String);

/// Mutable state shared between the trigger engine and the action executor.
#[derive(Debug, Default)]
pub struct HealingContext {
    /// Consecutive out-of-bounds cycles per (target, condition).
    counters: HashMap<CounterKey, u32>,
    /// Whether a healing cycle is currently executing.
    active: bool,
}

impl HealingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current streak for a (target, condition) pair.
    pub fn streak(&self, target: &str, condition: &str) -> u32 {
        self.counters
            .get(&(target.to_string(), condition.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Record an out-of-bounds reading; returns the incremented streak.
    pub fn record_breach(&mut self, target: &str, condition: &str) -> u32 {
        let counter = self
            .counters
            .entry((target.to_string(), condition.to_string()))
            .or_insert(0);
        *counter += 1;
        *counter
    }

    /// Record an in-bounds reading; the streak resets to zero.
    pub fn record_recovery(&mut self, target: &str, condition: &str) {
        self.counters
            .insert((target.to_string(), condition.to_string()), 0);
    }

    /// Reset one pair's streak to zero (post-action debounce).
    pub fn reset(&mut self, target: &str, condition: &str) {
        self.counters
            .insert((target.to_string(), condition.to_string()), 0);
    }

    /// Try to mark a healing cycle as started. Returns false if one is active.
    pub fn try_begin_cycle(&mut self) -> bool {
        if self.active {
            false
        } else {
            self.active = true;
            true
        }
    }

    /// Mark the current healing cycle finished.
    pub fn end_cycle(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Handle shared by the driver, trigger engine, and executor.
pub type SharedHealingContext = Arc<Mutex<HealingContext>>;

pub fn shared_context() -> SharedHealingContext {
    Arc::new(Mutex::new(HealingContext::new()))
}

/// Lock the context, recovering from poisoning.
///
/// A panic while holding this lock leaves only counters behind, which are
/// safe to reuse.
pub fn lock(ctx: &SharedHealingContext) -> MutexGuard<'_, HealingContext> {
    ctx.lock().unwrap_or_else(|e| {
        warn!("Healing context mutex poisoned, recovering");
        e.into_inner()
    })
}
