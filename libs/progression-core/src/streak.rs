//! Daily activity streak tracking.
//!
//! Day buckets are timezone-naive dates. The state machine rolls the
//! streak forward on consecutive days, resets after a gap, and no-ops
//! when a day has already been counted.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Per-learner streak record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: NaiveDate,
}

impl StreakState {
    /// Initial state for a learner's first qualifying activity.
    pub fn start(today: NaiveDate) -> Self {
        Self {
            current_streak: 1,
            longest_streak: 1,
            last_active_date: today,
        }
    }

    /// Apply a qualifying activity on `today`, returning the new state.
    ///
    /// Same day: unchanged. Next day: streak extends by one. Any larger
    /// gap (or a clock that moved backwards) resets to one.
    pub fn touch(&self, today: NaiveDate) -> Self {
        if today == self.last_active_date {
            return *self;
        }

        let current = if today == self.last_active_date + Duration::days(1) {
            self.current_streak + 1
        } else {
            1
        };

        Self {
            current_streak: current,
            longest_streak: self.longest_streak.max(current),
            last_active_date: today,
        }
    }
}

/// Streak-to-multiplier curve.
///
/// Monotone non-decreasing and bounded above: each streak day adds
/// `step` up to `cap` days. The curve is configuration, not logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultiplierCurve {
    pub step: f64,
    pub cap: u32,
}

impl Default for MultiplierCurve {
    fn default() -> Self {
        Self { step: 0.05, cap: 10 }
    }
}

impl MultiplierCurve {
    /// Multiplier for a given streak length.
    pub fn multiplier(&self, streak: u32) -> f64 {
        1.0 + self.step * f64::from(streak.min(self.cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn same_day_is_a_no_op() {
        let state = StreakState {
            current_streak: 4,
            longest_streak: 6,
            last_active_date: date(10),
        };
        assert_eq!(state.touch(date(10)), state);
    }

    #[test]
    fn next_day_extends_streak() {
        let state = StreakState {
            current_streak: 4,
            longest_streak: 6,
            last_active_date: date(10),
        };
        let next = state.touch(date(11));
        assert_eq!(next.current_streak, 5);
        assert_eq!(next.longest_streak, 6);
        assert_eq!(next.last_active_date, date(11));
    }

    #[test]
    fn gap_resets_to_one() {
        let state = StreakState {
            current_streak: 4,
            longest_streak: 6,
            last_active_date: date(10),
        };
        let next = state.touch(date(15));
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.longest_streak, 6);
    }

    #[test]
    fn longest_tracks_new_record() {
        let state = StreakState {
            current_streak: 6,
            longest_streak: 6,
            last_active_date: date(10),
        };
        let next = state.touch(date(11));
        assert_eq!(next.current_streak, 7);
        assert_eq!(next.longest_streak, 7);
    }

    #[test]
    fn backwards_clock_resets() {
        let state = StreakState {
            current_streak: 4,
            longest_streak: 6,
            last_active_date: date(10),
        };
        let next = state.touch(date(8));
        assert_eq!(next.current_streak, 1);
    }

    #[test]
    fn start_initializes_to_one() {
        let state = StreakState::start(date(1));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
    }

    #[test]
    fn multiplier_is_capped() {
        let curve = MultiplierCurve::default();
        assert_eq!(curve.multiplier(0), 1.0);
        assert_eq!(curve.multiplier(1), 1.05);
        assert_eq!(curve.multiplier(10), 1.5);
        assert_eq!(curve.multiplier(30), 1.5);
    }

    #[test]
    fn multiplier_is_monotone() {
        let curve = MultiplierCurve::default();
        let mut prev = 0.0;
        for streak in 0..20 {
            let m = curve.multiplier(streak);
            assert!(m >= prev);
            prev = m;
        }
    }
}
