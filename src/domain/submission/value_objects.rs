use serde::{Deserialize, Serialize};

/// Review status of a submission
///
/// # Status Transitions
/// ```text
/// Pending -> Scored
///    +-----> Rejected
/// ```
/// Scored and Rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Waiting for a judge
    Pending,
    /// Scored by a judge
    Scored,
    /// Rejected without a score
    Rejected,
}

impl SubmissionStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use judgeboard_api::domain::SubmissionStatus;
    ///
    /// assert!(SubmissionStatus::Pending.can_transition_to(SubmissionStatus::Scored));
    /// assert!(!SubmissionStatus::Scored.can_transition_to(SubmissionStatus::Pending));
    /// ```
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!((self, next), (Pending, Scored) | (Pending, Rejected))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }

    /// Stored JSON form, used by write guards
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_string())
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Scored => write!(f, "scored"),
            SubmissionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_pending_to_scored() {
        assert!(SubmissionStatus::Pending.can_transition_to(SubmissionStatus::Scored));
    }

    #[test]
    fn valid_transition_pending_to_rejected() {
        assert!(SubmissionStatus::Pending.can_transition_to(SubmissionStatus::Rejected));
    }

    #[test]
    fn terminal_states_never_transition() {
        use SubmissionStatus::*;
        for from in [Scored, Rejected] {
            for to in [Pending, Scored, Rejected] {
                assert!(!from.can_transition_to(to), "{} -> {} allowed", from, to);
            }
            assert!(from.is_terminal());
        }
    }

    #[test]
    fn pending_to_pending_is_not_a_transition() {
        assert!(!SubmissionStatus::Pending.can_transition_to(SubmissionStatus::Pending));
        assert!(!SubmissionStatus::Pending.is_terminal());
    }

    #[test]
    fn json_form_matches_serde() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::Scored,
            SubmissionStatus::Rejected,
        ] {
            assert_eq!(status.as_json(), serde_json::to_value(status).unwrap());
        }
    }
}
