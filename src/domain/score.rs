use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{ensure_present, EngineError, EngineResult};
use super::repositories::record_store::{Collection, Record};

/// Namespace for score ids derived from (submission, judge)
const SCORE_NAMESPACE: Uuid = Uuid::from_u128(0x6a0c_1f3e_9b2d_4e47_a8f5_2c61_d09b_7e14);

/// One judge's evaluation of one submission
///
/// The id is derived from the (submission, judge) pair, so a judge scoring
/// the same submission again overwrites the previous record instead of
/// adding a second one.
///
/// # Example
/// ```
/// use std::collections::BTreeMap;
/// use chrono::Utc;
/// use judgeboard_api::domain::Score;
/// use rust_decimal::Decimal;
///
/// let criteria = BTreeMap::from([
///     ("Innovation".to_string(), Decimal::from(25)),
///     ("Execution".to_string(), Decimal::from(18)),
/// ]);
/// let score = Score::new("S1", "judgeA", criteria, "solid", Utc::now()).expect("valid score");
///
/// assert_eq!(score.total_score(), Decimal::from(43));
/// assert_eq!(score.id(), Score::key_for("S1", "judgeA"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    id: String,
    submission_id: String,
    judge_id: String,
    criteria_scores: BTreeMap<String, Decimal>,
    total_score: Decimal,
    comment: String,
    scored_at: DateTime<Utc>,
}

impl Score {
    /// Creates a score, computing the total from the criteria
    ///
    /// Rubric bounds are checked by the scoring engine; this only rejects
    /// negative points and empty identifiers.
    pub fn new(
        submission_id: impl Into<String>,
        judge_id: impl Into<String>,
        criteria_scores: BTreeMap<String, Decimal>,
        comment: impl Into<String>,
        scored_at: DateTime<Utc>,
    ) -> EngineResult<Self> {
        let submission_id = submission_id.into();
        let judge_id = judge_id.into();
        ensure_present("submission_id", &submission_id)?;
        ensure_present("judge_id", &judge_id)?;

        for (name, points) in &criteria_scores {
            if *points < Decimal::ZERO {
                return Err(EngineError::validation(
                    name.clone(),
                    "points cannot be negative",
                ));
            }
        }

        let total_score = criteria_scores.values().copied().sum();

        Ok(Self {
            id: Self::key_for(&submission_id, &judge_id),
            submission_id,
            judge_id,
            criteria_scores,
            total_score,
            comment: comment.into(),
            scored_at,
        })
    }

    /// Stable id for the (submission, judge) idempotency key
    pub fn key_for(submission_id: &str, judge_id: &str) -> String {
        let name = format!("{}\u{1f}{}", submission_id, judge_id);
        Uuid::new_v5(&SCORE_NAMESPACE, name.as_bytes()).to_string()
    }

    /// True when a resubmission carries exactly the same evaluation
    pub fn same_evaluation(&self, criteria_scores: &BTreeMap<String, Decimal>, comment: &str) -> bool {
        self.comment == comment && self.criteria_scores == *criteria_scores
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    pub fn judge_id(&self) -> &str {
        &self.judge_id
    }

    /// Points per criterion, keyed by criterion name
    pub fn criteria_scores(&self) -> &BTreeMap<String, Decimal> {
        &self.criteria_scores
    }

    pub fn total_score(&self) -> Decimal {
        self.total_score
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn scored_at(&self) -> DateTime<Utc> {
        self.scored_at
    }
}

impl Record for Score {
    const COLLECTION: Collection = Collection::Scores;
    const ENTITY: &'static str = "Score";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn check_schema(&self) -> Result<(), String> {
        if self.id != Self::key_for(&self.submission_id, &self.judge_id) {
            return Err("id does not match submission and judge".to_string());
        }
        if self.criteria_scores.values().any(|p| *p < Decimal::ZERO) {
            return Err("negative criterion points".to_string());
        }
        let sum: Decimal = self.criteria_scores.values().copied().sum();
        if sum != self.total_score {
            return Err(format!(
                "total {} does not equal criteria sum {}",
                self.total_score, sum
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(innovation: i64, execution: i64) -> BTreeMap<String, Decimal> {
        BTreeMap::from([
            ("Innovation".to_string(), Decimal::from(innovation)),
            ("Execution".to_string(), Decimal::from(execution)),
        ])
    }

    #[test]
    fn total_is_sum_of_criteria() {
        let score = Score::new("S1", "judgeA", criteria(25, 18), "solid", Utc::now()).unwrap();

        assert_eq!(score.total_score(), Decimal::from(43));
        assert_eq!(score.comment(), "solid");
        assert!(score.check_schema().is_ok());
    }

    #[test]
    fn half_points_are_exact() {
        let scores = BTreeMap::from([
            ("Innovation".to_string(), Decimal::new(125, 1)),
            ("Execution".to_string(), Decimal::new(75, 1)),
        ]);
        let score = Score::new("S1", "judgeA", scores, "", Utc::now()).unwrap();

        assert_eq!(score.total_score(), Decimal::from(20));
    }

    #[test]
    fn negative_points_fail() {
        let result = Score::new("S1", "judgeA", criteria(-1, 18), "", Utc::now());

        match result {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "Innovation"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_judge_fails() {
        assert!(Score::new("S1", "", criteria(1, 1), "", Utc::now()).is_err());
    }

    #[test]
    fn key_is_stable_per_pair() {
        assert_eq!(Score::key_for("S1", "judgeA"), Score::key_for("S1", "judgeA"));
        assert_ne!(Score::key_for("S1", "judgeA"), Score::key_for("S1", "judgeB"));
        assert_ne!(Score::key_for("S1", "judgeA"), Score::key_for("S2", "judgeA"));
    }

    #[test]
    fn same_evaluation_compares_criteria_and_comment() {
        let score = Score::new("S1", "judgeA", criteria(25, 18), "solid", Utc::now()).unwrap();

        assert!(score.same_evaluation(&criteria(25, 18), "solid"));
        assert!(!score.same_evaluation(&criteria(25, 18), "great"));
        assert!(!score.same_evaluation(&criteria(24, 18), "solid"));
    }
}
