// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use handlers::{dashboard, leaderboard, submissions, teams};
pub use state::AppState;

/// Builds the judges' dashboard router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(dashboard::health_check))
        // Dashboard
        .route("/api/init", post(dashboard::initialize))
        .route("/api/overview", get(dashboard::overview))
        .route("/api/teams", get(teams::list_teams))
        .route(
            "/api/teams/:id/submissions",
            get(submissions::list_team_submissions),
        )
        .route("/api/tasks", get(teams::list_tasks))
        .route("/api/leaderboard", get(leaderboard::get_leaderboard))
        // Submission routes
        .route(
            "/api/submissions",
            get(submissions::list_submissions).post(submissions::create_submission),
        )
        .route("/api/submissions/pending", get(submissions::list_pending))
        .route("/api/submissions/:id", get(submissions::get_submission))
        .route("/api/submissions/:id/scores", get(submissions::list_scores))
        .route("/api/submissions/:id/score", post(submissions::score_submission))
        .route("/api/submissions/:id/reject", post(submissions::reject_submission))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
