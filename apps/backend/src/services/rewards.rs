//! Reward and progression orchestration.
//!
//! Ties the pure progression-core machinery to storage: a learner action
//! moves the topic state machine, a qualifying transition computes a
//! payout, and the ledger commits it idempotently. The streak is touched
//! before the payout is computed so the first activity of a day counts
//! toward its own multiplier; duplicate same-day touches are no-ops.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use progression_core::types::{EventKind, RewardConfig};
use progression_core::TopicProgress;

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::grading::Grader;

/// Progression and reward service.
#[derive(Clone)]
pub struct RewardService {
    db: Arc<Database>,
    config: RewardConfig,
}

impl RewardService {
    pub fn new(db: Arc<Database>, config: RewardConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Touch the streak, price the event, and commit it to the ledger.
    ///
    /// An accompanying topic-progress update rides in the ledger
    /// transaction, so a paid event and its progress commit together.
    /// Safe to call for an already-awarded subject: the ledger's unique
    /// idempotency key resolves the duplicate to `applied: false` and
    /// rolls the whole transaction back.
    async fn award(
        &self,
        learner_id: Uuid,
        kind: EventKind,
        subject_id: Uuid,
        metadata: Option<serde_json::Value>,
        problems_delta: i32,
        progress: Option<(Uuid, TopicProgress)>,
    ) -> Result<RewardOutcome> {
        let today = Utc::now().date_naive();
        let streak = self.db.touch_streak(learner_id, today).await?;
        let multiplier = self.config.curve.multiplier(streak.current_streak);
        let reward = self.config.table.compute(kind, multiplier, 0);

        let key = format!("{}:{}:{}", kind.key_prefix(), learner_id, subject_id);
        let outcome = self
            .db
            .record_event(
                learner_id,
                &key,
                kind.key_prefix(),
                &subject_id.to_string(),
                reward,
                metadata,
                problems_delta,
                progress.as_ref().map(|(topic_id, p)| (*topic_id, p)),
            )
            .await?;

        if outcome.applied {
            tracing::info!(
                learner = %learner_id,
                key = %key,
                points = outcome.points_awarded,
                xp = outcome.xp_awarded,
                "reward applied"
            );
        }

        Ok(outcome)
    }

    /// Load a topic's progress view (defaults for untouched topics).
    pub async fn topic_view(&self, learner_id: Uuid, topic: &Topic) -> Result<TopicProgressView> {
        let progress = self
            .db
            .get_topic_progress(learner_id, topic.id)
            .await?
            .map(|p| p.to_core())
            .unwrap_or_default();
        let total_problems = self.db.count_topic_problems(topic.id).await?;

        Ok(view_of(topic.id, &progress, total_problems))
    }

    /// Mark a topic video as watched. First watch counts as activity.
    pub async fn watch_video(&self, learner_id: Uuid, topic_id: Uuid) -> Result<TopicProgressView> {
        let topic = self.require_topic(topic_id).await?;

        let mut progress = self.current_progress(learner_id, topic_id).await?;
        let first_watch = progress.mark_video_watched();
        if first_watch {
            self.db
                .upsert_topic_progress(learner_id, topic_id, &progress)
                .await?;
            let today = Utc::now().date_naive();
            self.db.touch_streak(learner_id, today).await?;
        }

        self.topic_view(learner_id, &topic).await
    }

    /// Apply a quiz score. Passing awards once per topic through the ledger.
    pub async fn submit_quiz(
        &self,
        learner_id: Uuid,
        topic_id: Uuid,
        score: u32,
    ) -> Result<QuizSubmitResponse> {
        let topic = self.require_topic(topic_id).await?;

        let mut progress = self.current_progress(learner_id, topic_id).await?;
        if !progress.video_watched {
            return Err(ApiError::PreconditionFailed(
                "watch the topic video before taking the quiz".to_string(),
            ));
        }

        let outcome = progress.apply_quiz_score(score, self.config.quiz_pass_threshold)?;

        let reward = if outcome.passed {
            self.award(
                learner_id,
                EventKind::QuizPass,
                topic_id,
                Some(json!({ "score": score })),
                0,
                Some((topic_id, progress)),
            )
            .await?
        } else {
            RewardOutcome::already_applied()
        };

        Ok(QuizSubmitResponse {
            passed: outcome.passed,
            reward,
            progress: self.topic_view(learner_id, &topic).await?,
        })
    }

    /// Grade a problem submission and award on a correct verdict.
    pub async fn submit_problem(
        &self,
        learner_id: Uuid,
        problem_id: Uuid,
        submission: &str,
        grader: &dyn Grader,
    ) -> Result<ProblemSubmitResponse> {
        let problem = self
            .db
            .get_problem(problem_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Problem not found".to_string()))?;
        let topic = self.require_topic(problem.topic_id).await?;

        let mut progress = self.current_progress(learner_id, topic.id).await?;
        if !progress.quiz_passed {
            return Err(ApiError::PreconditionFailed(
                "pass the topic quiz before submitting problems".to_string(),
            ));
        }

        let verdict = grader.grade(&problem, submission);
        tracing::debug!(
            problem = %problem_id,
            grader = grader.name(),
            correct = verdict.is_correct,
            "graded submission"
        );

        if !verdict.is_correct {
            return Ok(ProblemSubmitResponse {
                correct: false,
                reward: RewardOutcome::already_applied(),
                progress: view_of(
                    topic.id,
                    &progress,
                    self.db.count_topic_problems(topic.id).await?,
                ),
            });
        }

        let difficulty = problem.difficulty();
        let total_problems = self.db.count_topic_problems(topic.id).await?;
        progress.record_problem_solved(total_problems);

        // The solved counter rides in the ledger transaction: a re-solve
        // of the same problem rolls both back, a paid solve commits both.
        let reward = self
            .award(
                learner_id,
                EventKind::SolveProblem(difficulty),
                problem_id,
                Some(json!({ "difficulty": difficulty.as_str() })),
                1,
                Some((topic.id, progress)),
            )
            .await?;

        Ok(ProblemSubmitResponse {
            correct: true,
            reward,
            progress: self.topic_view(learner_id, &topic).await?,
        })
    }

    /// Per-topic states for a course plus the overall completion gate.
    pub async fn course_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> Result<CourseProgressResponse> {
        let course = self
            .db
            .get_course(course_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

        let topics = self.db.get_course_topics(course.id).await?;
        let mut views = Vec::with_capacity(topics.len());
        for topic in &topics {
            views.push(self.topic_view(learner_id, topic).await?);
        }

        // A course with no topics is vacuously not completable.
        let complete = !views.is_empty()
            && views.iter().all(|v| v.state == TopicState::TopicComplete);

        let completed_at = self
            .db
            .get_enrollment(learner_id, course_id)
            .await?
            .and_then(|e| e.completed_at);

        Ok(CourseProgressResponse {
            course_id,
            topics: views,
            complete,
            completed_at,
        })
    }

    /// Claim course completion. The gate is re-verified server-side; an
    /// already-completed enrollment short-circuits without re-checking.
    pub async fn complete_course(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> Result<CourseCompleteResponse> {
        let course = self
            .db
            .get_course(course_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

        let enrollment = self
            .db
            .get_enrollment(learner_id, course_id)
            .await?
            .ok_or_else(|| {
                ApiError::PreconditionFailed("enroll in the course first".to_string())
            })?;

        if enrollment.completed_at.is_some() {
            return Ok(CourseCompleteResponse { awarded: false, points: 0, xp: 0 });
        }

        let progress = self.course_progress(learner_id, course_id).await?;
        if !progress.complete {
            return Err(ApiError::RequirementsNotMet(
                "not every topic in the course is complete".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        let streak = self.db.touch_streak(learner_id, today).await?;
        let multiplier = self.config.curve.multiplier(streak.current_streak);
        let kind = EventKind::CompleteCourse;
        let reward = self
            .config
            .table
            .compute(kind, multiplier, i64::from(course.completion_reward_points));
        let key = format!("{}:{}:{}", kind.key_prefix(), learner_id, course_id);

        // The enrollment claim and the payout share one transaction;
        // losing the race to a parallel claim resolves to "nothing
        // awarded" just like a ledger duplicate.
        let outcome = self
            .db
            .record_course_completion(
                learner_id,
                course_id,
                &key,
                kind.key_prefix(),
                reward,
                course.completion_reward_points,
                Some(json!({ "course": course.title })),
            )
            .await?;

        if outcome.applied {
            tracing::info!(
                learner = %learner_id,
                key = %key,
                points = outcome.points_awarded,
                "course completion awarded"
            );
        }

        Ok(CourseCompleteResponse {
            awarded: outcome.applied,
            points: outcome.points_awarded,
            xp: outcome.xp_awarded,
        })
    }

    async fn require_topic(&self, topic_id: Uuid) -> Result<Topic> {
        self.db
            .get_topic(topic_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))
    }

    async fn current_progress(&self, learner_id: Uuid, topic_id: Uuid) -> Result<TopicProgress> {
        Ok(self
            .db
            .get_topic_progress(learner_id, topic_id)
            .await?
            .map(|p| p.to_core())
            .unwrap_or_default())
    }
}

fn view_of(topic_id: Uuid, progress: &TopicProgress, total_problems: u32) -> TopicProgressView {
    TopicProgressView {
        topic_id,
        video_watched: progress.video_watched,
        quiz_passed: progress.quiz_passed,
        problems_completed: progress.problems_completed,
        total_problems,
        state: progress.state(total_problems),
    }
}
