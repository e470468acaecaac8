//! State Scorer — folds cumulative counters into a system status and quota.
//!
//! The health score is accumulated additively from a neutral base: sustained
//! healing success earns bonuses, while failure streaks, short uptime, an
//! empty opportunity window, slow cycles, disabled auto-commit, and a starved
//! quota each subtract a fixed penalty. Penalties are deductions, not weights
//! in an average.

use std::time::Duration;

use crate::config::defaults::QUOTA_BASE;
use crate::types::{PriorityMode, SystemStatus};

/// Neutral starting score before bonuses and penalties.
const BASE_SCORE: i64 = 50;

/// Cumulative counters the scorer folds per cycle.
#[derive(Debug, Clone)]
pub struct CycleCounters {
    /// Lifetime healing attempts.
    pub heals_attempted: u64,
    /// Lifetime successful heals.
    pub heals_succeeded: u64,
    /// Healing failures in a row.
    pub consecutive_heal_failures: u32,
    /// Time since process start.
    pub uptime: Duration,
    /// Work items discovered in the current window.
    pub opportunities_found: u64,
    /// Duration of the last completed cycle.
    pub last_cycle: Duration,
    /// Whether downstream auto-commit is enabled.
    pub auto_commit: bool,
    /// Quota budget carried in from the previous cycle.
    pub quota: i64,
}

/// Accumulate the health score for one set of counters.
pub fn health_score(c: &CycleCounters) -> i64 {
    let mut score = BASE_SCORE;

    // Healing success rate: bonus only, no penalty for a low rate.
    if c.heals_attempted > 0 {
        let rate = c.heals_succeeded as f64 / c.heals_attempted as f64;
        if rate >= 0.9 {
            score += 30;
        } else if rate >= 0.7 {
            score += 20;
        } else if rate >= 0.5 {
            score += 10;
        }
    }

    if c.consecutive_heal_failures >= 3 {
        score -= 20;
    } else if c.consecutive_heal_failures >= 2 {
        score -= 10;
    }

    let uptime_secs = c.uptime.as_secs();
    if uptime_secs < 3_600 {
        score -= 30;
    } else if uptime_secs < 6 * 3_600 {
        score -= 15;
    }

    if c.opportunities_found == 0 {
        score -= 20;
    } else if c.opportunities_found < 5 {
        score -= 10;
    }

    // The harsher slow-cycle penalty is checked first so it wins outright.
    let cycle_ms = c.last_cycle.as_millis();
    if cycle_ms > 120_000 {
        score -= 30;
    } else if cycle_ms > 60_000 {
        score -= 15;
    }

    if !c.auto_commit {
        score -= 10;
    }

    if c.quota < 50 {
        score -= 15;
    }

    score
}

/// Derive the quota budget from status and priority multipliers, truncated.
pub fn quota_budget(status: SystemStatus, priority: PriorityMode) -> i64 {
    (QUOTA_BASE * status.quota_multiplier() * priority.quota_multiplier()) as i64
}

/// Score one cycle: counters -> (status, quota budget).
///
/// Pure: identical counters and priority always yield identical output.
pub fn score(c: &CycleCounters, priority: PriorityMode) -> (SystemStatus, i64) {
    let status = SystemStatus::from_score(health_score(c));
    (status, quota_budget(status, priority))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_counters() -> CycleCounters {
        CycleCounters {
            heals_attempted: 10,
            heals_succeeded: 9,
            consecutive_heal_failures: 0,
            uptime: Duration::from_secs(72 * 3_600),
            opportunities_found: 48,
            last_cycle: Duration::from_millis(31_000),
            auto_commit: true,
            quota: 100,
        }
    }

    #[test]
    fn test_strong_counters_score_optimal() {
        // 9/10 heal success with long uptime and fast cycles: base 50 + 30.
        let c = healthy_counters();
        assert_eq!(health_score(&c), 80);
        let (status, quota) = score(&c, PriorityMode::PeakEvent);
        assert_eq!(status, SystemStatus::Optimal);
        // 100 * 1.2 * 1.5, truncated.
        assert_eq!(quota, 180);
    }

    #[test]
    fn test_scorer_is_pure() {
        let c = healthy_counters();
        assert_eq!(score(&c, PriorityMode::Baseline), score(&c, PriorityMode::Baseline));
        assert_eq!(health_score(&c), health_score(&c));
    }

    #[test]
    fn test_no_attempts_earns_no_bonus() {
        let mut c = healthy_counters();
        c.heals_attempted = 0;
        c.heals_succeeded = 0;
        assert_eq!(health_score(&c), 50);
    }

    #[test]
    fn test_success_rate_tiers() {
        let mut c = healthy_counters();

        c.heals_succeeded = 7; // 0.7
        assert_eq!(health_score(&c), 70);

        c.heals_succeeded = 5; // 0.5
        assert_eq!(health_score(&c), 60);

        c.heals_succeeded = 4; // 0.4: no bonus, no penalty
        assert_eq!(health_score(&c), 50);
    }

    #[test]
    fn test_consecutive_failure_penalties() {
        let mut c = healthy_counters();
        c.consecutive_heal_failures = 2;
        assert_eq!(health_score(&c), 70);
        c.consecutive_heal_failures = 3;
        assert_eq!(health_score(&c), 60);
        c.consecutive_heal_failures = 9;
        assert_eq!(health_score(&c), 60);
    }

    #[test]
    fn test_uptime_penalties() {
        let mut c = healthy_counters();
        c.uptime = Duration::from_secs(30 * 60);
        assert_eq!(health_score(&c), 50); // 80 - 30
        c.uptime = Duration::from_secs(3 * 3_600);
        assert_eq!(health_score(&c), 65); // 80 - 15
    }

    #[test]
    fn test_opportunity_penalties() {
        let mut c = healthy_counters();
        c.opportunities_found = 0;
        assert_eq!(health_score(&c), 60);
        c.opportunities_found = 4;
        assert_eq!(health_score(&c), 70);
        c.opportunities_found = 5;
        assert_eq!(health_score(&c), 80);
    }

    #[test]
    fn test_slow_cycle_penalty_not_doubled() {
        let mut c = healthy_counters();
        c.last_cycle = Duration::from_millis(90_000);
        assert_eq!(health_score(&c), 65); // 80 - 15

        // > 120s takes the severe penalty only, not both.
        c.last_cycle = Duration::from_millis(150_000);
        assert_eq!(health_score(&c), 50); // 80 - 30
    }

    #[test]
    fn test_auto_commit_and_quota_penalties() {
        let mut c = healthy_counters();
        c.auto_commit = false;
        assert_eq!(health_score(&c), 70);
        c.quota = 49;
        assert_eq!(health_score(&c), 55);
    }

    #[test]
    fn test_negative_score_maps_to_maintenance() {
        let c = CycleCounters {
            heals_attempted: 10,
            heals_succeeded: 1,
            consecutive_heal_failures: 5,
            uptime: Duration::from_secs(60),
            opportunities_found: 0,
            last_cycle: Duration::from_millis(200_000),
            auto_commit: false,
            quota: 0,
        };
        // 50 - 20 - 30 - 20 - 30 - 10 - 15 = -75
        assert_eq!(health_score(&c), -75);
        let (status, quota) = score(&c, PriorityMode::Baseline);
        assert_eq!(status, SystemStatus::Maintenance);
        assert_eq!(quota, 30);
    }

    #[test]
    fn test_quota_budget_pairs() {
        assert_eq!(quota_budget(SystemStatus::Maintenance, PriorityMode::LowSeason), 33);
        assert_eq!(quota_budget(SystemStatus::Active, PriorityMode::LowSeason), 99);
        assert_eq!(quota_budget(SystemStatus::Healthy, PriorityMode::Baseline), 100);
        assert_eq!(quota_budget(SystemStatus::Recovering, PriorityMode::SeasonOverlap), 98);
    }
}
