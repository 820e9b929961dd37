use axum::{extract::State, http::StatusCode, Json};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::services::Overview;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Seed default teams, tasks and submissions if the store is empty
///
/// POST /api/init
pub async fn initialize(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.dashboard.initialize_default_data().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Headline counts for the judges' overview page
///
/// GET /api/overview
pub async fn overview(State(state): State<AppState>) -> Result<Json<Overview>, ApiError> {
    let overview = state.dashboard.overview().await?;
    Ok(Json(overview))
}
