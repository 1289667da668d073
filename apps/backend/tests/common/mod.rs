//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for seeding catalog data and learners
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL).

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use progression_backend::db::Database;
use progression_backend::models::{Course, Problem, Topic};
use progression_backend::services::grading::StubGrader;
use progression_backend::services::rewards::RewardService;
use progression_backend::{build_router, AppState};
use progression_core::types::RewardConfig;

/// Test context containing database connection and test server.
///
/// Use this to set up integration tests with a real database connection.
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);

        let state = AppState {
            rewards: Arc::new(RewardService::new(db.clone(), RewardConfig::default())),
            grader: Arc::new(StubGrader),
            db: db.clone(),
        };

        let app = build_router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test learner and return its ID and token.
    pub async fn create_test_learner(&self, name: Option<&str>) -> (Uuid, String) {
        let learner = self
            .db
            .create_learner(name)
            .await
            .expect("Failed to create test learner");
        (learner.id, learner.token)
    }

    /// Seed a course with one module, `topics` topics, and
    /// `problems_per_topic` easy problems under each topic.
    pub async fn seed_course(
        &self,
        completion_reward_points: i32,
        topics: usize,
        problems_per_topic: usize,
    ) -> (Course, Vec<Topic>, Vec<Vec<Problem>>) {
        let course = self
            .db
            .create_course("Test course", completion_reward_points)
            .await
            .expect("Failed to create course");
        let module = self
            .db
            .create_module(course.id, "Module 1", 0)
            .await
            .expect("Failed to create module");

        let mut seeded_topics = Vec::new();
        let mut seeded_problems = Vec::new();
        for t in 0..topics {
            let topic = self
                .db
                .create_topic(module.id, &format!("Topic {}", t + 1), t as i32)
                .await
                .expect("Failed to create topic");

            let mut problems = Vec::new();
            for p in 0..problems_per_topic {
                let problem = self
                    .db
                    .create_problem(topic.id, &format!("Problem {}", p + 1), "easy")
                    .await
                    .expect("Failed to create problem");
                problems.push(problem);
            }

            seeded_topics.push(topic);
            seeded_problems.push(problems);
        }

        (course, seeded_topics, seeded_problems)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up test data for a learner.
    ///
    /// Call this after tests to remove test data.
    pub async fn cleanup_learner(&self, learner_id: Uuid) {
        // Delete in order due to foreign keys
        let _ = sqlx::query("DELETE FROM reward_events WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM topic_progress WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM streaks WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM enrollments WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM rank_snapshots WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM learners WHERE id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;
    }

    /// Clean up a seeded course (modules, topics, problems cascade).
    pub async fn cleanup_course(&self, course_id: Uuid) {
        let _ = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(self.db.pool())
            .await;
    }
}
