//! Priority selection from the demand calendar.
//!
//! Priority mode is a pure function of the current date. Windows are tested
//! most-specific first: the named multi-day peak event beats the monthly
//! season windows that contain it.

use chrono::{Datelike, NaiveDate};

use crate::types::PriorityMode;

/// Peak-event window: November 24 through December 2, inclusive.
const PEAK_EVENT_START: (u32, u32) = (11, 24);
const PEAK_EVENT_END: (u32, u32) = (12, 2);

/// Select the active priority mode for a date.
///
/// Window order (most specific wins):
/// 1. Peak event (Nov 24 - Dec 2) -> 1.5x
/// 2. Season overlap (September - October) -> 1.4x
/// 3. High season (November - February) -> 1.3x
/// 4. Mid season (March - April) -> 1.2x
/// 5. Low season (May - June) -> 1.1x
/// 6. Baseline (July - August) -> 1.0x
pub fn current_priority(date: NaiveDate) -> PriorityMode {
    let month = date.month();
    let day = date.day();

    if in_day_window(month, day, PEAK_EVENT_START, PEAK_EVENT_END) {
        return PriorityMode::PeakEvent;
    }

    match month {
        9 | 10 => PriorityMode::SeasonOverlap,
        11 | 12 | 1 | 2 => PriorityMode::HighSeason,
        3 | 4 => PriorityMode::MidSeason,
        5 | 6 => PriorityMode::LowSeason,
        _ => PriorityMode::Baseline,
    }
}

/// Whether (month, day) falls inside an inclusive (month, day) window that may
/// span a month boundary but not a year boundary.
fn in_day_window(month: u32, day: u32, start: (u32, u32), end: (u32, u32)) -> bool {
    let pos = (month, day);
    start <= pos && pos <= end
}
