//! Reward calculator.
//!
//! Pure payout math: (event kind, streak multiplier) -> points and XP.
//! No I/O and no hidden state, so it can be checked against fixed tables.

use serde::{Deserialize, Serialize};

use crate::types::{Difficulty, EventKind, Reward};

/// Base payout table with configurable values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardTable {
    pub easy_points: i64,
    pub medium_points: i64,
    pub hard_points: i64,
    pub quiz_points: i64,
    pub quiz_xp: i64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            easy_points: 100,
            medium_points: 200,
            hard_points: 300,
            quiz_points: 40,
            quiz_xp: 40,
        }
    }
}

impl RewardTable {
    /// Base points for a problem of the given difficulty.
    pub fn problem_points(&self, difficulty: Difficulty) -> i64 {
        match difficulty {
            Difficulty::Easy => self.easy_points,
            Difficulty::Medium => self.medium_points,
            Difficulty::Hard => self.hard_points,
        }
    }

    /// Compute the effective payout for an event.
    ///
    /// Course completion takes its base from the course's configured
    /// reward, passed as `course_points`. The multiplier scales both
    /// points and XP, rounded half-up.
    pub fn compute(&self, kind: EventKind, multiplier: f64, course_points: i64) -> Reward {
        let (base_points, base_xp) = match kind {
            EventKind::QuizPass => (self.quiz_points, self.quiz_xp),
            EventKind::SolveProblem(d) => {
                let p = self.problem_points(d);
                (p, p)
            }
            EventKind::CompleteCourse => (course_points, course_points),
        };

        Reward {
            points: scale(base_points, multiplier),
            xp: scale(base_xp, multiplier),
        }
    }
}

fn scale(base: i64, multiplier: f64) -> i64 {
    (base as f64 * multiplier).round() as i64
}
