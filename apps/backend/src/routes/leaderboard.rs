//! Leaderboard endpoints
//!
//! All read-only projections over learner totals and the reward ledger;
//! nothing here owns state. Ranks are recomputed on demand with a
//! deterministic tie-break, so repeated queries over unchanged data
//! return identical orderings.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};

use progression_core::{around_me, rank_entries, top_movers};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

const DEFAULT_TOP_N: usize = 10;
const DEFAULT_WINDOW: usize = 3;
const DEFAULT_MOVER_DAYS: i64 = 7;
const WEEKLY_DAYS: i64 = 7;
const SEASONAL_DAYS: i64 = 90;

/// GET /api/leaderboard/top?n=&scope=
pub async fn top(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let n = query.n.unwrap_or(DEFAULT_TOP_N);
    let scope = query.scope.unwrap_or_else(|| "all_time".to_string());

    let rows = match scope.as_str() {
        "all_time" => state.db.all_time_scores().await?,
        "weekly" => state.db.window_scores(WEEKLY_DAYS).await?,
        "seasonal" => state.db.window_scores(SEASONAL_DAYS).await?,
        other => {
            return Err(ApiError::BadRequest(format!("unknown scope: {other}")));
        }
    };

    let mut entries = rank_entries(rows);
    entries.truncate(n);

    Ok(Json(LeaderboardResponse { scope, entries }))
}

/// GET /api/leaderboard/around-me?window=
pub async fn around(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Query(query): Query<AroundMeQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let window = query.window.unwrap_or(DEFAULT_WINDOW);

    let ranked = rank_entries(state.db.all_time_scores().await?);
    let entries = around_me(&ranked, &auth.learner_id, window);

    Ok(Json(LeaderboardResponse {
        scope: "all_time".to_string(),
        entries,
    }))
}

/// GET /api/leaderboard/movers?n=&days=
pub async fn movers(
    State(state): State<AppState>,
    Query(query): Query<MoversQuery>,
) -> Result<Json<MoversResponse>> {
    let n = query.n.unwrap_or(DEFAULT_TOP_N);
    let days = query.days.unwrap_or(DEFAULT_MOVER_DAYS);
    if days <= 0 {
        return Err(ApiError::BadRequest("days must be positive".to_string()));
    }

    let cutoff = (Utc::now() - Duration::days(days)).date_naive();
    let previous = state.db.get_snapshot_at_or_before(cutoff).await?;

    // No snapshot that old: nobody has measurable movement yet.
    let movers = if previous.is_empty() {
        Vec::new()
    } else {
        let current = rank_entries(state.db.all_time_scores().await?);
        top_movers(&current, &previous, n)
    };

    Ok(Json(MoversResponse { days, movers }))
}

/// POST /api/leaderboard/snapshot
/// Records today's all-time ranks; idempotent per (learner, day)
pub async fn snapshot(State(state): State<AppState>) -> Result<Json<SnapshotResponse>> {
    let entries = rank_entries(state.db.all_time_scores().await?);
    let today = Utc::now().date_naive();
    let learners = state.db.insert_rank_snapshots(&entries, today).await?;

    tracing::info!(learners, date = %today, "recorded rank snapshot");

    Ok(Json(SnapshotResponse {
        snapshot_date: today,
        learners,
    }))
}
