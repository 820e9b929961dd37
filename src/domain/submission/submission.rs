use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::SubmissionEvent;
use super::value_objects::SubmissionStatus;
use crate::domain::errors::{ensure_present, EngineError, EngineResult};
use crate::domain::repositories::record_store::{Collection, Record};

/// Submission aggregate root
///
/// A team's work product for a task, together with its review status.
///
/// # Invariants
/// - Team, task and content reference are never empty
/// - Status only moves Pending -> Scored or Pending -> Rejected
/// - `reviewed_at` is set exactly when the status is terminal
/// - `rejection_reason` is set exactly when the status is Rejected
///
/// # Example
/// ```
/// use chrono::Utc;
/// use judgeboard_api::domain::{Submission, SubmissionStatus};
///
/// let (submission, event) = Submission::new(
///     "S1",
///     "alpha",
///     "prototype",
///     "https://git.example.com/alpha/prototype",
///     Utc::now(),
/// )
/// .expect("valid submission");
///
/// assert_eq!(submission.status(), SubmissionStatus::Pending);
/// assert_eq!(event.submission_id(), "S1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    id: String,
    team_id: String,
    task_id: String,
    content_ref: String,
    submitted_at: DateTime<Utc>,
    status: SubmissionStatus,
    #[serde(default)]
    reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    rejection_reason: Option<String>,
}

impl Submission {
    /// Creates a new pending submission
    ///
    /// # Returns
    /// * `Ok((Submission, SubmissionEvent))` - New submission and its Submitted event
    /// * `Err(EngineError::Validation)` - If any identifier or the content reference is empty
    pub fn new(
        id: impl Into<String>,
        team_id: impl Into<String>,
        task_id: impl Into<String>,
        content_ref: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> EngineResult<(Self, SubmissionEvent)> {
        let submission = Self {
            id: id.into(),
            team_id: team_id.into(),
            task_id: task_id.into(),
            content_ref: content_ref.into(),
            submitted_at,
            status: SubmissionStatus::Pending,
            reviewed_at: None,
            rejection_reason: None,
        };
        submission.validate()?;

        let event = SubmissionEvent::Submitted {
            submission_id: submission.id.clone(),
            team_id: submission.team_id.clone(),
            task_id: submission.task_id.clone(),
        };

        Ok((submission, event))
    }

    fn validate(&self) -> EngineResult<()> {
        ensure_present("submission.id", &self.id)?;
        ensure_present("submission.team_id", &self.team_id)?;
        ensure_present("submission.task_id", &self.task_id)?;
        ensure_present("submission.content_ref", &self.content_ref)?;

        let terminal = self.status.is_terminal();
        if terminal != self.reviewed_at.is_some() {
            return Err(EngineError::validation(
                "submission.reviewed_at",
                format!("inconsistent with status {}", self.status),
            ));
        }
        let rejected = self.status == SubmissionStatus::Rejected;
        if rejected != self.rejection_reason.is_some() {
            return Err(EngineError::validation(
                "submission.rejection_reason",
                format!("inconsistent with status {}", self.status),
            ));
        }
        Ok(())
    }

    fn transition(&mut self, next: SubmissionStatus, at: DateTime<Utc>) -> EngineResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(EngineError::Conflict(format!(
                "Submission {} is {} and cannot become {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.reviewed_at = Some(at);
        Ok(())
    }

    /// Marks the submission as scored
    ///
    /// Only the scoring engine calls this, inside the same write batch that
    /// stores the judge's Score.
    pub(crate) fn mark_scored(
        &mut self,
        judge_id: &str,
        total_score: rust_decimal::Decimal,
        at: DateTime<Utc>,
    ) -> EngineResult<SubmissionEvent> {
        self.transition(SubmissionStatus::Scored, at)?;

        Ok(SubmissionEvent::Scored {
            submission_id: self.id.clone(),
            judge_id: judge_id.to_string(),
            total_score,
        })
    }

    /// Rejects the submission with a reason
    pub(crate) fn reject(
        &mut self,
        reason: String,
        at: DateTime<Utc>,
    ) -> EngineResult<SubmissionEvent> {
        ensure_present("reason", &reason)?;
        self.transition(SubmissionStatus::Rejected, at)?;
        self.rejection_reason = Some(reason.clone());

        Ok(SubmissionEvent::Rejected {
            submission_id: self.id.clone(),
            reason,
        })
    }

    // ===== Getters =====

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Where the submitted work lives (repository URL, file key, ...)
    pub fn content_ref(&self) -> &str {
        &self.content_ref
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }
}

impl Record for Submission {
    const COLLECTION: Collection = Collection::Submissions;
    const ENTITY: &'static str = "Submission";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn check_schema(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())
    }
}
