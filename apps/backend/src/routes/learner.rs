//! Learner registration and profile endpoints

use axum::{extract::State, Extension, Json};

use progression_core::{level_for_xp, next_level_xp};

use crate::error::{ApiError, Result};
use crate::models::{LearnerRegisterRequest, LearnerRegisterResponse, ProfileResponse, StreakInfo};
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

/// POST /api/learner/register
/// Creates a new learner and returns the token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Option<LearnerRegisterRequest>>,
) -> Result<Json<LearnerRegisterResponse>> {
    let display_name = payload.and_then(|p| p.display_name);
    let learner = state.db.create_learner(display_name.as_deref()).await?;

    tracing::info!("Registered new learner: {}", learner.id);

    Ok(Json(LearnerRegisterResponse {
        learner_id: learner.id,
        token: learner.token,
    }))
}

/// GET /api/learner/profile
/// Cumulative counters plus level/title derived from total XP
pub async fn profile(
    Extension(auth): Extension<AuthenticatedLearner>,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>> {
    let learner = state
        .db
        .get_learner(auth.learner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Learner not found".to_string()))?;

    let level = level_for_xp(learner.total_xp);
    let curve = state.rewards.config().curve;

    let streak = match state.db.get_streak(learner.id).await? {
        Some(record) => {
            let core = record.to_core();
            StreakInfo {
                current_streak: core.current_streak,
                longest_streak: core.longest_streak,
                multiplier: curve.multiplier(core.current_streak),
            }
        }
        None => StreakInfo {
            current_streak: 0,
            longest_streak: 0,
            multiplier: curve.multiplier(0),
        },
    };

    Ok(Json(ProfileResponse {
        learner_id: learner.id,
        display_name: learner.display_name,
        total_points: learner.total_points,
        total_xp: learner.total_xp,
        level: level.level,
        title: level.title.to_string(),
        next_level_xp: next_level_xp(learner.total_xp),
        problems_solved: learner.problems_solved,
        courses_completed: learner.courses_completed,
        streak,
    }))
}
