use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::errors::{ensure_present, EngineError, EngineResult};
use crate::domain::repositories::record_store::{Collection, Guard, Record, RecordStore, WriteBatch};
use crate::domain::score::Score;
use crate::domain::submission::{Submission, SubmissionStatus};
use crate::domain::task::Task;

type LockMap = Arc<SyncMutex<HashMap<String, Arc<Mutex<()>>>>>;

/// Per-submission async locks
///
/// Writers of the same submission queue up; writers of different
/// submissions proceed in parallel. An entry lives only while some task
/// holds or waits for it.
#[derive(Default)]
struct SubmissionLocks {
    inner: LockMap,
}

impl SubmissionLocks {
    async fn acquire(&self, submission_id: &str) -> SubmissionLock {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries left by cancelled waiters
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(submission_id.to_string()).or_default().clone()
        };
        SubmissionLock {
            submission_id: submission_id.to_string(),
            guard: Some(lock.lock_owned().await),
            locks: self.inner.clone(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Held lock on one submission; releasing the last holder drops the entry
struct SubmissionLock {
    submission_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl Drop for SubmissionLock {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters hold their own clone of the Arc, so only the map remains
        // once the last user is gone.
        drop(self.guard.take());
        let idle = locks
            .get(&self.submission_id)
            .map_or(false, |lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&self.submission_id);
        }
    }
}

/// Checks every scored criterion against the task's rubric
///
/// # Business Rules
/// - At least one criterion must be scored
/// - Every key must name a rubric criterion
/// - Points must lie in `0..=criterion.max_points`
pub fn validate_criteria(task: &Task, criteria_scores: &BTreeMap<String, Decimal>) -> EngineResult<()> {
    if criteria_scores.is_empty() {
        return Err(EngineError::validation(
            "criteria_scores",
            "at least one criterion score is required",
        ));
    }

    for (name, points) in criteria_scores {
        let criterion = task.criterion(name).ok_or_else(|| {
            EngineError::validation(
                name.clone(),
                format!("not a criterion of task {}", task.id()),
            )
        })?;

        if *points < Decimal::ZERO {
            return Err(EngineError::validation(
                name.clone(),
                format!("{} is below the minimum of 0", points),
            ));
        }
        if *points > criterion.max_points {
            return Err(EngineError::validation(
                name.clone(),
                format!("{} exceeds the maximum of {}", points, criterion.max_points),
            ));
        }
    }

    Ok(())
}

/// Records judges' scores and moves submissions out of Pending
///
/// The only component allowed to change a submission's status.
pub struct ScoringEngine {
    store: Arc<dyn RecordStore>,
    locks: SubmissionLocks,
}

impl ScoringEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            locks: SubmissionLocks::default(),
        }
    }

    async fn load_submission(&self, submission_id: &str) -> EngineResult<Submission> {
        self.store
            .fetch::<Submission>(submission_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Submission::ENTITY, submission_id))
    }

    fn pending_guard(submission_id: &str) -> Guard {
        Guard::field_equals(
            Collection::Submissions,
            submission_id,
            "status",
            SubmissionStatus::Pending.as_json(),
        )
    }

    /// Scores a pending submission on behalf of a judge
    ///
    /// # Returns
    /// * `Ok(Score)` - The stored score; the submission is now Scored
    /// * `Err(EngineError::NotFound)` - Unknown submission or task
    /// * `Err(EngineError::Conflict)` - Submission is no longer pending
    /// * `Err(EngineError::Validation)` - Criterion missing from the rubric or out of range
    ///
    /// Resubmitting an identical evaluation for a submission this judge
    /// already scored returns the stored score without writing anything,
    /// so client retries are safe.
    pub async fn submit_score(
        &self,
        submission_id: &str,
        judge_id: &str,
        criteria_scores: BTreeMap<String, Decimal>,
        comment: &str,
    ) -> EngineResult<Score> {
        ensure_present("judge_id", judge_id)?;
        let _lock = self.locks.acquire(submission_id).await;

        let mut submission = self.load_submission(submission_id).await?;

        if submission.status() != SubmissionStatus::Pending {
            let key = Score::key_for(submission_id, judge_id);
            if let Some(existing) = self.store.fetch::<Score>(&key).await? {
                if existing.same_evaluation(&criteria_scores, comment) {
                    tracing::debug!(submission_id, judge_id, "Replayed identical score");
                    return Ok(existing);
                }
            }
            return Err(EngineError::Conflict(format!(
                "Submission {} is already {}",
                submission_id,
                submission.status()
            )));
        }

        let task = self
            .store
            .fetch::<Task>(submission.task_id())
            .await?
            .ok_or_else(|| EngineError::not_found(Task::ENTITY, submission.task_id()))?;

        validate_criteria(&task, &criteria_scores)?;

        let now = Utc::now();
        let score = Score::new(submission_id, judge_id, criteria_scores, comment, now)?;
        let event = submission.mark_scored(judge_id, score.total_score(), now)?;

        let batch = WriteBatch::new()
            .guard(Self::pending_guard(submission_id))
            .put(&score)?
            .put(&submission)?;
        self.store.apply(batch).await?;

        tracing::info!(
            submission_id,
            judge_id,
            total_score = %score.total_score(),
            max_points = %task.max_points(),
            "Submission {}",
            event.kind()
        );

        Ok(score)
    }

    /// Rejects a pending submission
    pub async fn reject_submission(&self, submission_id: &str, reason: &str) -> EngineResult<Submission> {
        let _lock = self.locks.acquire(submission_id).await;

        let mut submission = self.load_submission(submission_id).await?;
        ensure_present("reason", reason)?;
        let event = submission.reject(reason.to_string(), Utc::now())?;

        let batch = WriteBatch::new()
            .guard(Self::pending_guard(submission_id))
            .put(&submission)?;
        self.store.apply(batch).await?;

        tracing::info!(submission_id, reason, "Submission {}", event.kind());

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::Criterion;
    use crate::domain::team::Team;
    use crate::infrastructure::repositories::MemoryRecordStore;

    fn prototype_task() -> Task {
        Task::new(
            "prototype",
            "Prototype Build",
            vec![Criterion::new("Innovation", 30), Criterion::new("Execution", 20)],
        )
        .unwrap()
    }

    fn points(entries: &[(&str, i64)]) -> BTreeMap<String, Decimal> {
        entries
            .iter()
            .map(|(name, p)| (name.to_string(), Decimal::from(*p)))
            .collect()
    }

    async fn setup() -> (Arc<dyn RecordStore>, ScoringEngine) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let team = Team::new("alpha", "Team Alpha", vec!["ada".to_string()]).unwrap();
        let (submission, _) =
            Submission::new("S1", "alpha", "prototype", "repo://alpha", Utc::now()).unwrap();
        let batch = WriteBatch::new()
            .put(&team)
            .unwrap()
            .put(&prototype_task())
            .unwrap()
            .put(&submission)
            .unwrap();
        store.apply(batch).await.unwrap();

        let engine = ScoringEngine::new(store.clone());
        (store, engine)
    }

    async fn status_of(store: &Arc<dyn RecordStore>, id: &str) -> SubmissionStatus {
        store.fetch::<Submission>(id).await.unwrap().unwrap().status()
    }

    async fn score_count(store: &Arc<dyn RecordStore>) -> usize {
        store.fetch_all::<Score>().await.unwrap().len()
    }

    #[tokio::test]
    async fn scoring_prototype_example() {
        let (store, engine) = setup().await;

        let score = engine
            .submit_score(
                "S1",
                "judgeA",
                points(&[("Innovation", 25), ("Execution", 18)]),
                "solid",
            )
            .await
            .unwrap();

        assert_eq!(score.total_score(), Decimal::from(43));
        assert_eq!(status_of(&store, "S1").await, SubmissionStatus::Scored);
        assert_eq!(score_count(&store).await, 1);
    }

    #[tokio::test]
    async fn out_of_range_criterion_writes_nothing() {
        let (store, engine) = setup().await;

        let result = engine
            .submit_score(
                "S1",
                "judgeA",
                points(&[("Innovation", 35), ("Execution", 18)]),
                "x",
            )
            .await;

        match result {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "Innovation"),
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert_eq!(status_of(&store, "S1").await, SubmissionStatus::Pending);
        assert_eq!(score_count(&store).await, 0);
    }

    #[tokio::test]
    async fn boundary_values_are_accepted() {
        let (_, engine) = setup().await;

        let score = engine
            .submit_score(
                "S1",
                "judgeA",
                points(&[("Innovation", 0), ("Execution", 20)]),
                "",
            )
            .await
            .unwrap();

        assert_eq!(score.total_score(), Decimal::from(20));
    }

    #[tokio::test]
    async fn negative_points_are_rejected() {
        let (_, engine) = setup().await;

        let result = engine
            .submit_score("S1", "judgeA", points(&[("Execution", -1)]), "")
            .await;

        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[tokio::test]
    async fn unknown_criterion_is_rejected() {
        let (_, engine) = setup().await;

        let result = engine
            .submit_score("S1", "judgeA", points(&[("Design", 5)]), "")
            .await;

        match result {
            Err(EngineError::Validation { field, message }) => {
                assert_eq!(field, "Design");
                assert!(message.contains("prototype"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_scores_and_judge_are_rejected() {
        let (_, engine) = setup().await;

        assert!(matches!(
            engine.submit_score("S1", "judgeA", BTreeMap::new(), "").await,
            Err(EngineError::Validation { .. })
        ));
        assert!(matches!(
            engine
                .submit_score("S1", " ", points(&[("Execution", 1)]), "")
                .await,
            Err(EngineError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn missing_submission_is_not_found() {
        let (_, engine) = setup().await;

        let result = engine
            .submit_score("S9", "judgeA", points(&[("Execution", 1)]), "")
            .await;

        assert!(matches!(
            result,
            Err(EngineError::NotFound { entity: "Submission", .. })
        ));
    }

    #[tokio::test]
    async fn identical_resubmission_is_idempotent() {
        let (store, engine) = setup().await;
        let scores = points(&[("Innovation", 25), ("Execution", 18)]);

        let first = engine
            .submit_score("S1", "judgeA", scores.clone(), "solid")
            .await
            .unwrap();
        let second = engine
            .submit_score("S1", "judgeA", scores, "solid")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(score_count(&store).await, 1);
    }

    #[tokio::test]
    async fn different_rescore_after_terminal_conflicts() {
        let (store, engine) = setup().await;
        engine
            .submit_score("S1", "judgeA", points(&[("Innovation", 25)]), "solid")
            .await
            .unwrap();

        let changed = engine
            .submit_score("S1", "judgeA", points(&[("Innovation", 20)]), "solid")
            .await;
        let other_judge = engine
            .submit_score("S1", "judgeB", points(&[("Innovation", 25)]), "solid")
            .await;

        assert!(matches!(changed, Err(EngineError::Conflict(_))));
        assert!(matches!(other_judge, Err(EngineError::Conflict(_))));
        let stored = store.fetch_all::<Score>().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].total_score(), Decimal::from(25));
    }

    #[tokio::test]
    async fn reject_then_score_conflicts() {
        let (store, engine) = setup().await;

        let rejected = engine.reject_submission("S1", "Off topic").await.unwrap();
        assert_eq!(rejected.status(), SubmissionStatus::Rejected);

        let result = engine
            .submit_score("S1", "judgeA", points(&[("Execution", 10)]), "")
            .await;

        assert!(matches!(result, Err(EngineError::Conflict(_))));
        assert_eq!(status_of(&store, "S1").await, SubmissionStatus::Rejected);
        assert_eq!(score_count(&store).await, 0);
    }

    #[tokio::test]
    async fn reject_twice_conflicts() {
        let (_, engine) = setup().await;

        engine.reject_submission("S1", "Off topic").await.unwrap();
        let result = engine.reject_submission("S1", "Off topic").await;

        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[tokio::test]
    async fn reject_missing_submission_is_not_found() {
        let (_, engine) = setup().await;

        assert!(matches!(
            engine.reject_submission("S9", "nope").await,
            Err(EngineError::NotFound { .. })
        ));
        assert!(matches!(
            engine.reject_submission("S9", "").await,
            Err(EngineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn reject_requires_reason() {
        let (store, engine) = setup().await;

        assert!(matches!(
            engine.reject_submission("S1", " ").await,
            Err(EngineError::Validation { .. })
        ));
        assert_eq!(status_of(&store, "S1").await, SubmissionStatus::Pending);
    }

    #[tokio::test]
    async fn lock_entries_are_released() {
        let (_, engine) = setup().await;

        for i in 0..100 {
            let result = engine
                .submit_score(&format!("ghost-{}", i), "judgeA", points(&[("Execution", 1)]), "")
                .await;
            assert!(matches!(result, Err(EngineError::NotFound { .. })));
            assert!(engine.reject_submission(&format!("ghost-{}", i), "x").await.is_err());
        }
        engine
            .submit_score("S1", "judgeA", points(&[("Execution", 1)]), "")
            .await
            .unwrap();

        assert_eq!(engine.locks.len(), 0);
    }

    #[tokio::test]
    async fn concurrent_judges_produce_one_score() {
        let (store, engine) = setup().await;
        let engine = Arc::new(engine);

        let handles: Vec<_> = ["judgeA", "judgeB", "judgeC", "judgeD"]
            .into_iter()
            .map(|judge| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .submit_score("S1", judge, points(&[("Execution", 10)]), "")
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(EngineError::Conflict(_)) => {}
                Err(other) => panic!("Unexpected error: {:?}", other),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(score_count(&store).await, 1);
        assert_eq!(status_of(&store, "S1").await, SubmissionStatus::Scored);
        assert_eq!(engine.locks.len(), 0);
    }
}
