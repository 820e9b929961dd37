use async_trait::async_trait;

use crate::domain::errors::EngineResult;
use crate::domain::submission::Submission;

/// Repository trait for the Submission aggregate
///
/// Read and create access only. Status transitions go through the scoring
/// engine so the Score/Submission pairing is enforced in one place.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Find a submission by id, failing with `NotFound` if absent
    async fn get(&self, id: &str) -> EngineResult<Submission>;

    /// Pending submissions, oldest first
    async fn list_pending(&self) -> EngineResult<Vec<Submission>>;

    /// All submissions of a team, oldest first
    async fn list_by_team(&self, team_id: &str) -> EngineResult<Vec<Submission>>;

    /// Every submission, oldest first
    async fn list_all(&self) -> EngineResult<Vec<Submission>>;

    /// Record new work from a team for a task
    async fn create(
        &self,
        team_id: &str,
        task_id: &str,
        content_ref: &str,
    ) -> EngineResult<Submission>;
}
