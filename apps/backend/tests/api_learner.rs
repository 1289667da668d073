//! Learner API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL before running.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;

use common::fixtures;
use common::TestContext;

/// Test registration returns a usable token.
#[tokio::test]
#[ignore = "requires database"]
async fn test_register_returns_token() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/learner/register")
        .json(&fixtures::register_request(Some("ada")))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(!body["token"].as_str().unwrap().is_empty());

    let learner_id = body["learner_id"].as_str().unwrap().parse().unwrap();
    ctx.cleanup_learner(learner_id).await;
}

/// Test a fresh profile has zeroed counters and level 1.
#[tokio::test]
#[ignore = "requires database"]
async fn test_fresh_profile_is_level_one() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (learner_id, token) = ctx.create_test_learner(None).await;

    let response = server
        .get("/api/learner/profile")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["total_points"].as_i64().unwrap(), 0);
    assert_eq!(body["total_xp"].as_i64().unwrap(), 0);
    assert_eq!(body["level"].as_u64().unwrap(), 1);
    assert_eq!(body["title"].as_str().unwrap(), "Newcomer");
    assert_eq!(body["streak"]["current_streak"].as_u64().unwrap(), 0);

    ctx.cleanup_learner(learner_id).await;
}

/// Test profile endpoint requires authentication.
#[tokio::test]
#[ignore = "requires database"]
async fn test_profile_requires_auth() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/api/learner/profile").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
