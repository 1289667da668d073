//! Core progression library shared by the learning-platform backend.
//!
//! Provides:
//! - Reward calculator (difficulty/event tables, streak multipliers)
//! - Daily streak state machine
//! - Per-topic progression state machine (video -> quiz -> problems)
//! - Level/title lookup derived from XP
//! - Leaderboard ranking helpers (top N, around-me, movers)

pub mod error;
pub mod leaderboard;
pub mod level;
pub mod progress;
pub mod reward;
pub mod streak;
pub mod types;

pub use error::{ProgressionError, Result};
pub use leaderboard::{around_me, rank_entries, top_movers, RankEntry, RankMover, ScoreRow};
pub use level::{level_for_xp, next_level_xp, LevelInfo, LEVELS};
pub use progress::{QuizOutcome, TopicProgress};
pub use reward::RewardTable;
pub use streak::{MultiplierCurve, StreakState};
pub use types::{Difficulty, EventKind, Reward, RewardConfig, TopicState};
