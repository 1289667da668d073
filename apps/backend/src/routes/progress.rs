//! Progression endpoints: enrollment, video, quiz, problems, completion

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

/// POST /api/courses/{course_id}/enroll
pub async fn enroll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<EnrollResponse>> {
    state
        .db
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let enrollment = state.db.enroll(auth.learner_id, course_id).await?;

    Ok(Json(EnrollResponse {
        course_id: enrollment.course_id,
        enrolled_at: enrollment.enrolled_at,
        completed_at: enrollment.completed_at,
    }))
}

/// POST /api/topics/{topic_id}/video
pub async fn watch_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<TopicProgressView>> {
    let view = state.rewards.watch_video(auth.learner_id, topic_id).await?;
    Ok(Json(view))
}

/// POST /api/topics/{topic_id}/quiz
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(topic_id): Path<Uuid>,
    Json(payload): Json<QuizSubmitRequest>,
) -> Result<Json<QuizSubmitResponse>> {
    let response = state
        .rewards
        .submit_quiz(auth.learner_id, topic_id, payload.score)
        .await?;
    Ok(Json(response))
}

/// GET /api/topics/{topic_id}/progress
pub async fn topic_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<TopicProgressView>> {
    let topic = state
        .db
        .get_topic(topic_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    let view = state.rewards.topic_view(auth.learner_id, &topic).await?;
    Ok(Json(view))
}

/// POST /api/problems/{problem_id}/submit
pub async fn submit_problem(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(problem_id): Path<Uuid>,
    Json(payload): Json<ProblemSubmitRequest>,
) -> Result<Json<ProblemSubmitResponse>> {
    let response = state
        .rewards
        .submit_problem(
            auth.learner_id,
            problem_id,
            &payload.submission,
            state.grader.as_ref(),
        )
        .await?;
    Ok(Json(response))
}

/// GET /api/courses/{course_id}/progress
pub async fn course_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseProgressResponse>> {
    let response = state
        .rewards
        .course_progress(auth.learner_id, course_id)
        .await?;
    Ok(Json(response))
}

/// POST /api/courses/{course_id}/complete
pub async fn complete_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseCompleteResponse>> {
    let response = state
        .rewards
        .complete_course(auth.learner_id, course_id)
        .await?;
    Ok(Json(response))
}
