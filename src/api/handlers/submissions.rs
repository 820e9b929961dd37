use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::middleware::JudgeId;
use crate::api::state::AppState;
use crate::domain::score::Score;
use crate::domain::submission::Submission;

/// Request body for handing in work
#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub team_id: String,
    pub task_id: String,
    pub content_ref: String,
}

/// Request body for scoring a submission
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub criteria_scores: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub comment: String,
}

/// Request body for rejecting a submission
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: String,
    pub team_id: String,
    pub task_id: String,
    pub content_ref: String,
    pub submitted_at: DateTime<Utc>,
    pub status: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl From<&Submission> for SubmissionResponse {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id().to_string(),
            team_id: submission.team_id().to_string(),
            task_id: submission.task_id().to_string(),
            content_ref: submission.content_ref().to_string(),
            submitted_at: submission.submitted_at(),
            status: submission.status().to_string(),
            reviewed_at: submission.reviewed_at(),
            rejection_reason: submission.rejection_reason().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub id: String,
    pub submission_id: String,
    pub judge_id: String,
    pub criteria_scores: BTreeMap<String, Decimal>,
    pub total_score: Decimal,
    pub comment: String,
    pub scored_at: DateTime<Utc>,
}

impl From<&Score> for ScoreResponse {
    fn from(score: &Score) -> Self {
        Self {
            id: score.id().to_string(),
            submission_id: score.submission_id().to_string(),
            judge_id: score.judge_id().to_string(),
            criteria_scores: score.criteria_scores().clone(),
            total_score: score.total_score(),
            comment: score.comment().to_string(),
            scored_at: score.scored_at(),
        }
    }
}

/// Hand in work for a task
///
/// POST /api/submissions
pub async fn create_submission(
    State(state): State<AppState>,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let submission = state
        .dashboard
        .submit_work(&req.team_id, &req.task_id, &req.content_ref)
        .await?;

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from(&submission))))
}

/// Every submission, oldest first
///
/// GET /api/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let submissions = state.dashboard.list_submissions().await?;
    Ok(Json(submissions.iter().map(SubmissionResponse::from).collect()))
}

/// A team's submissions, oldest first
///
/// GET /api/teams/:id/submissions
pub async fn list_team_submissions(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let submissions = state.dashboard.team_submissions(&team_id).await?;
    Ok(Json(submissions.iter().map(SubmissionResponse::from).collect()))
}

/// Submissions waiting for a judge, oldest first
///
/// GET /api/submissions/pending
pub async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let pending = state.dashboard.get_pending_submissions().await?;
    Ok(Json(pending.iter().map(SubmissionResponse::from).collect()))
}

/// Get a submission by ID
///
/// GET /api/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = state.dashboard.get_submission(&id).await?;
    Ok(Json(SubmissionResponse::from(&submission)))
}

/// Judges' scores and comments for a submission
///
/// GET /api/submissions/:id/scores
pub async fn list_scores(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ScoreResponse>>, ApiError> {
    let scores = state.dashboard.scores_for_submission(&id).await?;
    Ok(Json(scores.iter().map(ScoreResponse::from).collect()))
}

/// Score a pending submission as the calling judge
///
/// POST /api/submissions/:id/score
pub async fn score_submission(
    State(state): State<AppState>,
    JudgeId(judge_id): JudgeId,
    Path(id): Path<String>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let score = state
        .dashboard
        .submit_score(&id, &judge_id, req.criteria_scores, &req.comment)
        .await?;

    Ok(Json(ScoreResponse::from(&score)))
}

/// Reject a pending submission as the calling judge
///
/// POST /api/submissions/:id/reject
pub async fn reject_submission(
    State(state): State<AppState>,
    JudgeId(judge_id): JudgeId,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> Result<StatusCode, ApiError> {
    state.dashboard.reject_submission(&id, &req.reason).await?;
    tracing::info!(submission_id = %id, judge_id = %judge_id, "Rejection recorded");
    Ok(StatusCode::NO_CONTENT)
}
