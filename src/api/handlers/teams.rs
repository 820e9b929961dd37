use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::task::{Criterion, Task};
use crate::domain::team::Team;

/// Team as shown on the teams page
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id().to_string(),
            name: team.name().to_string(),
            members: team.members().to_vec(),
            created_at: team.created_at(),
        }
    }
}

/// Task with its rubric
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub max_points: Decimal,
    pub criteria: Vec<Criterion>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().to_string(),
            title: task.title().to_string(),
            max_points: task.max_points(),
            criteria: task.criteria().to_vec(),
        }
    }
}

/// List all teams
///
/// GET /api/teams
pub async fn list_teams(State(state): State<AppState>) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let teams = state.dashboard.list_teams().await?;
    Ok(Json(teams.iter().map(TeamResponse::from).collect()))
}

/// List all tasks with their rubrics
///
/// GET /api/tasks
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state.dashboard.list_tasks().await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}
