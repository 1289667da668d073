//! Core types for the progression and reward engine.

use serde::{Deserialize, Serialize};

use crate::reward::RewardTable;
use crate::streak::MultiplierCurve;

/// Problem difficulty tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Easy
    }
}

impl Difficulty {
    /// Get the difficulty name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Reward-granting event kinds.
///
/// Each kind maps to a deterministic idempotency key prefix, so a given
/// (kind, learner, subject) triple pays out at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    QuizPass,
    SolveProblem(Difficulty),
    CompleteCourse,
}

impl EventKind {
    /// Idempotency key prefix for this event kind.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::QuizPass => "quiz_pass",
            Self::SolveProblem(_) => "solve_problem",
            Self::CompleteCourse => "complete_course",
        }
    }
}

/// Points and XP to award for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub points: i64,
    pub xp: i64,
}

/// Per-topic progression state, derived from the stored flags and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicState {
    NotStarted,
    VideoWatched,
    QuizPassed,
    ProblemsInProgress,
    TopicComplete,
}

/// Reward configuration: payout tables plus the streak multiplier curve.
///
/// Exact constants are configuration, not state-machine logic; the
/// defaults match the platform's published tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    pub table: RewardTable,
    pub curve: MultiplierCurve,
    /// Integer percent a quiz score must reach to pass.
    pub quiz_pass_threshold: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            table: RewardTable::default(),
            curve: MultiplierCurve::default(),
            quiz_pass_threshold: 70,
        }
    }
}
