//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from progression-core
pub use progression_core::types::{Difficulty, EventKind, Reward, RewardConfig, TopicState};
pub use progression_core::{RankEntry, RankMover, StreakState, TopicProgress};

// === Database Entity Types ===

/// Learner identity plus cumulative counters.
///
/// Level and title are derived from total_xp on read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Learner {
    pub id: Uuid,
    pub token: String,
    pub display_name: Option<String>,
    pub total_points: i64,
    pub total_xp: i64,
    pub problems_solved: i32,
    pub courses_completed: i32,
    pub xp_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Course catalog row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub completion_reward_points: i32,
    pub created_at: DateTime<Utc>,
}

/// Module catalog row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: i32,
}

/// Topic catalog row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub position: i32,
}

/// Problem catalog row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Problem {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub title: String,
    pub difficulty: String,
}

impl Problem {
    /// Parse the stored difficulty, defaulting unknown values to easy.
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_str(&self.difficulty).unwrap_or_default()
    }
}

/// Topic progress stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTopicProgress {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub topic_id: Uuid,
    pub video_watched: bool,
    pub quiz_passed: bool,
    pub problems_completed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbTopicProgress {
    /// Convert to progression-core TopicProgress
    pub fn to_core(&self) -> TopicProgress {
        TopicProgress {
            video_watched: self.video_watched,
            quiz_passed: self.quiz_passed,
            problems_completed: self.problems_completed.max(0) as u32,
        }
    }
}

/// Reward ledger row. Append-only; one row per idempotency key ever.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RewardEvent {
    pub id: Uuid,
    pub idempotency_key: String,
    pub learner_id: Uuid,
    pub event_type: String,
    pub subject_id: String,
    pub points: i64,
    pub xp: i64,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Streak record stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StreakRecord {
    pub learner_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl StreakRecord {
    /// Convert to progression-core StreakState
    pub fn to_core(&self) -> StreakState {
        StreakState {
            current_streak: self.current_streak.max(0) as u32,
            longest_streak: self.longest_streak.max(0) as u32,
            last_active_date: self.last_active_date,
        }
    }
}

/// Enrollment row; completed_at is set at most once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_points_awarded: i32,
}

/// Unranked leaderboard input row
#[derive(Debug, Clone, FromRow)]
pub struct ScoreRowDb {
    pub user_id: Uuid,
    pub total_xp: i64,
    pub xp_updated_at: DateTime<Utc>,
}

/// Persisted rank snapshot row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RankSnapshotRow {
    pub learner_id: Uuid,
    pub rank: i32,
    pub total_xp: i64,
    pub snapshot_date: NaiveDate,
}

// === Ledger outcome ===

/// Result of an idempotent ledger commit.
///
/// A duplicate idempotency key is a normal outcome, not an error:
/// `applied` is false and nothing was paid out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardOutcome {
    pub applied: bool,
    pub points_awarded: i64,
    pub xp_awarded: i64,
}

impl RewardOutcome {
    pub fn already_applied() -> Self {
        Self { applied: false, points_awarded: 0, xp_awarded: 0 }
    }
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerRegisterRequest {
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerRegisterResponse {
    pub learner_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreakInfo {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub multiplier: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub learner_id: Uuid,
    pub display_name: Option<String>,
    pub total_points: i64,
    pub total_xp: i64,
    pub level: u32,
    pub title: String,
    pub next_level_xp: Option<i64>,
    pub problems_solved: i32,
    pub courses_completed: i32,
    pub streak: StreakInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Progress view for one topic
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicProgressView {
    pub topic_id: Uuid,
    pub video_watched: bool,
    pub quiz_passed: bool,
    pub problems_completed: u32,
    pub total_problems: u32,
    pub state: TopicState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizSubmitRequest {
    pub score: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizSubmitResponse {
    pub passed: bool,
    pub reward: RewardOutcome,
    pub progress: TopicProgressView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemSubmitRequest {
    pub submission: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemSubmitResponse {
    pub correct: bool,
    pub reward: RewardOutcome,
    pub progress: TopicProgressView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseProgressResponse {
    pub course_id: Uuid,
    pub topics: Vec<TopicProgressView>,
    pub complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseCompleteResponse {
    pub awarded: bool,
    pub points: i64,
    pub xp: i64,
}

// Leaderboard types

#[derive(Debug, Serialize, Deserialize)]
pub struct TopQuery {
    pub n: Option<usize>,
    pub scope: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AroundMeQuery {
    pub window: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoversQuery {
    pub n: Option<usize>,
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub scope: String,
    pub entries: Vec<RankEntry<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct MoversResponse {
    pub days: i64,
    pub movers: Vec<RankMover<Uuid>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_date: NaiveDate,
    pub learners: usize,
}
