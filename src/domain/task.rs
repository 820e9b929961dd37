use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::{ensure_present, EngineError, EngineResult};
use super::repositories::record_store::{Collection, Record};

/// One weighted line of a task's rubric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub max_points: Decimal,
}

impl Criterion {
    pub fn new(name: impl Into<String>, max_points: impl Into<Decimal>) -> Self {
        Self {
            name: name.into(),
            max_points: max_points.into(),
        }
    }
}

/// A judged task and its rubric
///
/// # Invariants
/// - `max_points` equals the sum of the criteria's maximums
/// - Criterion names are unique and non-empty
/// - Every criterion maximum is positive
///
/// # Example
/// ```
/// use judgeboard_api::domain::{Criterion, Task};
/// use rust_decimal::Decimal;
///
/// let task = Task::new(
///     "prototype",
///     "Prototype Build",
///     vec![Criterion::new("Innovation", 30), Criterion::new("Execution", 20)],
/// )
/// .expect("valid rubric");
///
/// assert_eq!(task.max_points(), Decimal::from(50));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: String,
    title: String,
    max_points: Decimal,
    criteria: Vec<Criterion>,
}

impl Task {
    /// Creates a task whose maximum is derived from its rubric
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        criteria: Vec<Criterion>,
    ) -> EngineResult<Self> {
        let max_points = criteria.iter().map(|c| c.max_points).sum();
        let task = Self {
            id: id.into(),
            title: title.into(),
            max_points,
            criteria,
        };
        task.validate()?;
        Ok(task)
    }

    fn validate(&self) -> EngineResult<()> {
        ensure_present("task.id", &self.id)?;
        ensure_present("task.title", &self.title)?;

        if self.criteria.is_empty() {
            return Err(EngineError::validation(
                "task.criteria",
                "rubric needs at least one criterion",
            ));
        }

        let mut seen = HashSet::new();
        for criterion in &self.criteria {
            ensure_present("task.criteria.name", &criterion.name)?;
            if !seen.insert(criterion.name.as_str()) {
                return Err(EngineError::validation(
                    criterion.name.clone(),
                    "duplicate criterion name",
                ));
            }
            if criterion.max_points <= Decimal::ZERO {
                return Err(EngineError::validation(
                    criterion.name.clone(),
                    "maximum points must be positive",
                ));
            }
        }

        let total: Decimal = self.criteria.iter().map(|c| c.max_points).sum();
        if total != self.max_points {
            return Err(EngineError::validation(
                "task.max_points",
                format!(
                    "rubric sums to {} but task maximum is {}",
                    total, self.max_points
                ),
            ));
        }

        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn max_points(&self) -> Decimal {
        self.max_points
    }

    /// Rubric criteria in display order
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn criterion(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.name == name)
    }
}

impl Record for Task {
    const COLLECTION: Collection = Collection::Tasks;
    const ENTITY: &'static str = "Task";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn check_schema(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rubric() -> Vec<Criterion> {
        vec![Criterion::new("Innovation", 30), Criterion::new("Execution", 20)]
    }

    #[test]
    fn max_points_is_rubric_sum() {
        let task = Task::new("prototype", "Prototype Build", rubric()).unwrap();

        assert_eq!(task.max_points(), Decimal::from(50));
        assert_eq!(task.criteria().len(), 2);
        assert_eq!(task.criterion("Execution").unwrap().max_points, Decimal::from(20));
        assert!(task.criterion("Design").is_none());
    }

    #[test]
    fn empty_rubric_fails() {
        assert!(Task::new("t", "Empty", vec![]).is_err());
    }

    #[test]
    fn duplicate_criterion_fails() {
        let result = Task::new(
            "t",
            "Dupes",
            vec![Criterion::new("Design", 10), Criterion::new("Design", 5)],
        );

        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn non_positive_criterion_fails() {
        assert!(Task::new("t", "Zero", vec![Criterion::new("Design", 0)]).is_err());
    }

    #[test]
    fn stored_task_with_wrong_total_fails_schema_check() {
        let mut task = Task::new("prototype", "Prototype Build", rubric()).unwrap();
        task.max_points = Decimal::from(45);

        assert!(task.check_schema().is_err());
    }
}
