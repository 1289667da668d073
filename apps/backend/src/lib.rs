pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use progression_core::types::RewardConfig;

use crate::db::Database;
use crate::services::grading::{Grader, StubGrader};
use crate::services::rewards::RewardService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub rewards: Arc<RewardService>,
    pub grader: Arc<dyn Grader>,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let db = Arc::new(db);
    let state = AppState {
        rewards: Arc::new(RewardService::new(db.clone(), RewardConfig::default())),
        grader: Arc::new(StubGrader),
        db,
    };

    let app = build_router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full router with protected routes behind the auth middleware
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Learner routes
        .route("/api/learner/profile", get(routes::learner::profile))
        // Progression routes
        .route("/api/courses/:course_id/enroll", post(routes::progress::enroll))
        .route("/api/courses/:course_id/progress", get(routes::progress::course_progress))
        .route("/api/courses/:course_id/complete", post(routes::progress::complete_course))
        .route("/api/topics/:topic_id/video", post(routes::progress::watch_video))
        .route("/api/topics/:topic_id/quiz", post(routes::progress::submit_quiz))
        .route("/api/topics/:topic_id/progress", get(routes::progress::topic_progress))
        .route("/api/problems/:problem_id/submit", post(routes::progress::submit_problem))
        // Leaderboard routes
        .route("/api/leaderboard/top", get(routes::leaderboard::top))
        .route("/api/leaderboard/around-me", get(routes::leaderboard::around))
        .route("/api/leaderboard/movers", get(routes::leaderboard::movers))
        .route("/api/leaderboard/snapshot", post(routes::leaderboard::snapshot))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/learner/register", post(routes::learner::register))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
