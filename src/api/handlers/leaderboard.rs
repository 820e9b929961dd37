use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::LeaderboardEntry;

/// Current standings, best team first
///
/// GET /api/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let entries = state.dashboard.get_leaderboard().await?;
    Ok(Json(entries))
}
