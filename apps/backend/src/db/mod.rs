//! PostgreSQL database operations

use chrono::{NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use progression_core::{RankEntry, ScoreRow, StreakState};

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Learner Repository ===

    /// Create a new learner with generated token
    pub async fn create_learner(&self, display_name: Option<&str>) -> Result<Learner> {
        let token = Uuid::new_v4().to_string();
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            INSERT INTO learners (token, display_name)
            VALUES ($1, $2)
            RETURNING id, token, display_name, total_points, total_xp,
                      problems_solved, courses_completed, xp_updated_at,
                      created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Get learner by token
    pub async fn get_learner_by_token(&self, token: &str) -> Result<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            SELECT id, token, display_name, total_points, total_xp,
                   problems_solved, courses_completed, xp_updated_at,
                   created_at, last_seen_at
            FROM learners
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Get learner by id
    pub async fn get_learner(&self, learner_id: Uuid) -> Result<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            SELECT id, token, display_name, total_points, total_xp,
                   problems_solved, courses_completed, xp_updated_at,
                   created_at, last_seen_at
            FROM learners
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Update learner last_seen_at timestamp
    pub async fn update_last_seen(&self, learner_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE learners
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Catalog Repository ===
    //
    // The catalog is authored elsewhere; these writers exist for seeding
    // and tests, the readers for gating and payouts.

    /// Create a course
    pub async fn create_course(&self, title: &str, completion_reward_points: i32) -> Result<Course> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, completion_reward_points)
            VALUES ($1, $2)
            RETURNING id, title, completion_reward_points, created_at
            "#,
        )
        .bind(title)
        .bind(completion_reward_points)
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    /// Create a module under a course
    pub async fn create_module(&self, course_id: Uuid, title: &str, position: i32) -> Result<Module> {
        let module = sqlx::query_as::<_, Module>(
            r#"
            INSERT INTO modules (course_id, title, position)
            VALUES ($1, $2, $3)
            RETURNING id, course_id, title, position
            "#,
        )
        .bind(course_id)
        .bind(title)
        .bind(position)
        .fetch_one(&self.pool)
        .await?;

        Ok(module)
    }

    /// Create a topic under a module
    pub async fn create_topic(&self, module_id: Uuid, title: &str, position: i32) -> Result<Topic> {
        let topic = sqlx::query_as::<_, Topic>(
            r#"
            INSERT INTO topics (module_id, title, position)
            VALUES ($1, $2, $3)
            RETURNING id, module_id, title, position
            "#,
        )
        .bind(module_id)
        .bind(title)
        .bind(position)
        .fetch_one(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Create a problem under a topic
    pub async fn create_problem(&self, topic_id: Uuid, title: &str, difficulty: &str) -> Result<Problem> {
        let problem = sqlx::query_as::<_, Problem>(
            r#"
            INSERT INTO problems (topic_id, title, difficulty)
            VALUES ($1, $2, $3)
            RETURNING id, topic_id, title, difficulty
            "#,
        )
        .bind(topic_id)
        .bind(title)
        .bind(difficulty)
        .fetch_one(&self.pool)
        .await?;

        Ok(problem)
    }

    /// Get course by id
    pub async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, completion_reward_points, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    /// Get topic by id
    pub async fn get_topic(&self, topic_id: Uuid) -> Result<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, module_id, title, position
            FROM topics
            WHERE id = $1
            "#,
        )
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Get problem by id
    pub async fn get_problem(&self, problem_id: Uuid) -> Result<Option<Problem>> {
        let problem = sqlx::query_as::<_, Problem>(
            r#"
            SELECT id, topic_id, title, difficulty
            FROM problems
            WHERE id = $1
            "#,
        )
        .bind(problem_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(problem)
    }

    /// Count problems configured under a topic
    pub async fn count_topic_problems(&self, topic_id: Uuid) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM problems
            WHERE topic_id = $1
            "#,
        )
        .bind(topic_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u32)
    }

    /// All topics under a course's modules, in module/topic order
    pub async fn get_course_topics(&self, course_id: Uuid) -> Result<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(
            r#"
            SELECT t.id, t.module_id, t.title, t.position
            FROM topics t
            JOIN modules m ON t.module_id = m.id
            WHERE m.course_id = $1
            ORDER BY m.position, t.position
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    // === Topic Progress Repository ===

    /// Get topic progress row
    pub async fn get_topic_progress(
        &self,
        learner_id: Uuid,
        topic_id: Uuid,
    ) -> Result<Option<DbTopicProgress>> {
        let progress = sqlx::query_as::<_, DbTopicProgress>(
            r#"
            SELECT id, learner_id, topic_id, video_watched, quiz_passed,
                   problems_completed, created_at, updated_at
            FROM topic_progress
            WHERE learner_id = $1 AND topic_id = $2
            "#,
        )
        .bind(learner_id)
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Upsert topic progress.
    ///
    /// The update arms are monotone (OR for flags, GREATEST for the
    /// counter) so concurrent writers can never regress progress.
    pub async fn upsert_topic_progress(
        &self,
        learner_id: Uuid,
        topic_id: Uuid,
        progress: &TopicProgress,
    ) -> Result<()> {
        Self::upsert_progress_on(&self.pool, learner_id, topic_id, progress).await
    }

    async fn upsert_progress_on<'e, E>(
        executor: E,
        learner_id: Uuid,
        topic_id: Uuid,
        progress: &TopicProgress,
    ) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO topic_progress (learner_id, topic_id, video_watched,
                                        quiz_passed, problems_completed)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (learner_id, topic_id) DO UPDATE SET
                video_watched = topic_progress.video_watched OR EXCLUDED.video_watched,
                quiz_passed = topic_progress.quiz_passed OR EXCLUDED.quiz_passed,
                problems_completed = GREATEST(topic_progress.problems_completed,
                                              EXCLUDED.problems_completed),
                updated_at = NOW()
            "#,
        )
        .bind(learner_id)
        .bind(topic_id)
        .bind(progress.video_watched)
        .bind(progress.quiz_passed)
        .bind(progress.problems_completed as i32)
        .execute(executor)
        .await?;

        Ok(())
    }

    // === Streak Repository ===

    /// Get streak record
    pub async fn get_streak(&self, learner_id: Uuid) -> Result<Option<StreakRecord>> {
        let streak = sqlx::query_as::<_, StreakRecord>(
            r#"
            SELECT learner_id, current_streak, longest_streak,
                   last_active_date, updated_at
            FROM streaks
            WHERE learner_id = $1
            "#,
        )
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(streak)
    }

    /// Apply a qualifying activity for `today` and return the new state.
    ///
    /// Initializes the record on a learner's first activity.
    pub async fn touch_streak(&self, learner_id: Uuid, today: NaiveDate) -> Result<StreakState> {
        let next = match self.get_streak(learner_id).await? {
            Some(record) => record.to_core().touch(today),
            None => StreakState::start(today),
        };

        sqlx::query(
            r#"
            INSERT INTO streaks (learner_id, current_streak, longest_streak, last_active_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (learner_id) DO UPDATE SET
                current_streak = EXCLUDED.current_streak,
                longest_streak = EXCLUDED.longest_streak,
                last_active_date = EXCLUDED.last_active_date,
                updated_at = NOW()
            "#,
        )
        .bind(learner_id)
        .bind(next.current_streak as i32)
        .bind(next.longest_streak as i32)
        .bind(next.last_active_date)
        .execute(&self.pool)
        .await?;

        Ok(next)
    }

    // === Reward Ledger ===

    /// Idempotently commit a reward event and apply the learner deltas.
    ///
    /// The insert, the counter update, and the optional topic-progress
    /// upsert share one transaction: a payout that exists in the ledger
    /// is always reflected in the learner's totals and progress. A
    /// duplicate idempotency key (including a concurrent race resolved
    /// by the unique constraint) yields `applied: false` with zero
    /// awarded, never an error.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_event(
        &self,
        learner_id: Uuid,
        idempotency_key: &str,
        event_type: &str,
        subject_id: &str,
        reward: Reward,
        metadata: Option<serde_json::Value>,
        problems_delta: i32,
        progress: Option<(Uuid, &TopicProgress)>,
    ) -> Result<RewardOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO reward_events (idempotency_key, learner_id, event_type,
                                       subject_id, points, xp, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(idempotency_key)
        .bind(learner_id)
        .bind(event_type)
        .bind(subject_id)
        .bind(reward.points)
        .bind(reward.xp)
        .bind(&metadata)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RewardOutcome::already_applied());
        }

        sqlx::query(
            r#"
            UPDATE learners
            SET total_points = total_points + $2,
                total_xp = total_xp + $3,
                problems_solved = problems_solved + $4,
                xp_updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .bind(reward.points)
        .bind(reward.xp)
        .bind(problems_delta)
        .execute(&mut *tx)
        .await?;

        if let Some((topic_id, progress)) = progress {
            Self::upsert_progress_on(&mut *tx, learner_id, topic_id, progress).await?;
        }

        tx.commit().await?;

        Ok(RewardOutcome {
            applied: true,
            points_awarded: reward.points,
            xp_awarded: reward.xp,
        })
    }

    /// Get a ledger row by idempotency key
    pub async fn get_event_by_key(&self, idempotency_key: &str) -> Result<Option<RewardEvent>> {
        let event = sqlx::query_as::<_, RewardEvent>(
            r#"
            SELECT id, idempotency_key, learner_id, event_type, subject_id,
                   points, xp, metadata, created_at
            FROM reward_events
            WHERE idempotency_key = $1
            "#,
        )
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Count ledger rows for an idempotency key (tests assert this is <= 1)
    pub async fn count_events_for_key(&self, idempotency_key: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM reward_events
            WHERE idempotency_key = $1
            "#,
        )
        .bind(idempotency_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // === Enrollment Repository ===

    /// Enroll a learner in a course (idempotent)
    pub async fn enroll(&self, learner_id: Uuid, course_id: Uuid) -> Result<Enrollment> {
        sqlx::query(
            r#"
            INSERT INTO enrollments (learner_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (learner_id, course_id) DO NOTHING
            "#,
        )
        .bind(learner_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        let enrollment = self
            .get_enrollment(learner_id, course_id)
            .await?
            .ok_or_else(|| ApiError::Internal("enrollment row missing after upsert".to_string()))?;

        Ok(enrollment)
    }

    /// Get an enrollment row
    pub async fn get_enrollment(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, learner_id, course_id, enrolled_at, completed_at,
                   completion_points_awarded
            FROM enrollments
            WHERE learner_id = $1 AND course_id = $2
            "#,
        )
        .bind(learner_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// Claim course completion and commit its payout in one transaction.
    ///
    /// The guarded enrollment UPDATE, the ledger insert, and the learner
    /// counter update succeed or fail together: a set completed_at always
    /// has a matching reward event. An already-claimed enrollment or a
    /// duplicate idempotency key (including a parallel claim losing the
    /// race) yields `applied: false`, never an error.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_course_completion(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        idempotency_key: &str,
        event_type: &str,
        reward: Reward,
        base_points: i32,
        metadata: Option<serde_json::Value>,
    ) -> Result<RewardOutcome> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            r#"
            UPDATE enrollments
            SET completed_at = NOW(),
                completion_points_awarded = $3
            WHERE learner_id = $1 AND course_id = $2 AND completed_at IS NULL
            "#,
        )
        .bind(learner_id)
        .bind(course_id)
        .bind(base_points)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RewardOutcome::already_applied());
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO reward_events (idempotency_key, learner_id, event_type,
                                       subject_id, points, xp, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(idempotency_key)
        .bind(learner_id)
        .bind(event_type)
        .bind(course_id.to_string())
        .bind(reward.points)
        .bind(reward.xp)
        .bind(&metadata)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RewardOutcome::already_applied());
        }

        sqlx::query(
            r#"
            UPDATE learners
            SET total_points = total_points + $2,
                total_xp = total_xp + $3,
                courses_completed = courses_completed + 1,
                xp_updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .bind(reward.points)
        .bind(reward.xp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RewardOutcome {
            applied: true,
            points_awarded: reward.points,
            xp_awarded: reward.xp,
        })
    }

    // === Leaderboard Projection ===

    /// All-time XP totals for every learner
    pub async fn all_time_scores(&self) -> Result<Vec<ScoreRow<Uuid>>> {
        let rows = sqlx::query_as::<_, ScoreRowDb>(
            r#"
            SELECT id AS user_id, total_xp, xp_updated_at
            FROM learners
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_score_row).collect())
    }

    /// XP earned from ledger events within a trailing window of days.
    ///
    /// The tie-break timestamp is the learner's last awarding event in
    /// the window, so the earlier finisher of a tied total ranks first.
    pub async fn window_scores(&self, days: i64) -> Result<Vec<ScoreRow<Uuid>>> {
        let since = Utc::now() - chrono::Duration::days(days);

        let rows = sqlx::query_as::<_, ScoreRowDb>(
            r#"
            SELECT learner_id AS user_id,
                   SUM(xp)::BIGINT AS total_xp,
                   MAX(created_at) AS xp_updated_at
            FROM reward_events
            WHERE created_at >= $1
            GROUP BY learner_id
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_score_row).collect())
    }

    /// Persist today's ranks (idempotent per learner per day)
    pub async fn insert_rank_snapshots(
        &self,
        entries: &[RankEntry<Uuid>],
        snapshot_date: NaiveDate,
    ) -> Result<usize> {
        let mut count = 0;
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO rank_snapshots (learner_id, rank, total_xp, snapshot_date)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (learner_id, snapshot_date) DO UPDATE SET
                    rank = EXCLUDED.rank,
                    total_xp = EXCLUDED.total_xp
                "#,
            )
            .bind(entry.user_id)
            .bind(entry.rank as i32)
            .bind(entry.total_xp)
            .bind(snapshot_date)
            .execute(&self.pool)
            .await?;
            count += 1;
        }
        Ok(count)
    }

    /// Most recent snapshot taken at or before the given date
    pub async fn get_snapshot_at_or_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RankEntry<Uuid>>> {
        let snapshot_date: Option<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT MAX(snapshot_date)
            FROM rank_snapshots
            WHERE snapshot_date <= $1
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        let Some(snapshot_date) = snapshot_date else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, RankSnapshotRow>(
            r#"
            SELECT learner_id, rank, total_xp, snapshot_date
            FROM rank_snapshots
            WHERE snapshot_date = $1
            ORDER BY rank
            "#,
        )
        .bind(snapshot_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| RankEntry {
                user_id: r.learner_id,
                total_xp: r.total_xp,
                rank: r.rank.max(0) as u32,
            })
            .collect())
    }
}

fn to_score_row(row: ScoreRowDb) -> ScoreRow<Uuid> {
    ScoreRow {
        user_id: row.user_id,
        total_xp: row.total_xp,
        xp_updated_at: row.xp_updated_at,
    }
}
