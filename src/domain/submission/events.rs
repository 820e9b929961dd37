use rust_decimal::Decimal;

/// Domain events emitted by the Submission aggregate
///
/// The engine logs them; they also describe what an outbox or audit
/// trail would record.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionEvent {
    /// A team handed in work for a task
    Submitted {
        submission_id: String,
        team_id: String,
        task_id: String,
    },
    /// A judge's score moved the submission to Scored
    Scored {
        submission_id: String,
        judge_id: String,
        total_score: Decimal,
    },
    /// A judge rejected the submission
    Rejected {
        submission_id: String,
        reason: String,
    },
}

impl SubmissionEvent {
    pub fn submission_id(&self) -> &str {
        match self {
            SubmissionEvent::Submitted { submission_id, .. } => submission_id,
            SubmissionEvent::Scored { submission_id, .. } => submission_id,
            SubmissionEvent::Rejected { submission_id, .. } => submission_id,
        }
    }

    /// Short name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionEvent::Submitted { .. } => "submitted",
            SubmissionEvent::Scored { .. } => "scored",
            SubmissionEvent::Rejected { .. } => "rejected",
        }
    }
}
