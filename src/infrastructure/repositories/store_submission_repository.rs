use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::repositories::record_store::{Record, RecordStore};
use crate::domain::repositories::SubmissionRepository;
use crate::domain::submission::{Submission, SubmissionStatus};
use crate::domain::task::Task;
use crate::domain::team::Team;

/// SubmissionRepository backed by the record store's `submissions` collection
pub struct StoreSubmissionRepository {
    store: Arc<dyn RecordStore>,
}

impl StoreSubmissionRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn list_where(
        &self,
        keep: impl Fn(&Submission) -> bool + Send,
    ) -> EngineResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .store
            .fetch_all::<Submission>()
            .await?
            .into_iter()
            .filter(|s| keep(s))
            .collect();
        sort_oldest_first(&mut submissions);
        Ok(submissions)
    }
}

/// FIFO review order: submission time, then id for equal timestamps
pub(crate) fn sort_oldest_first(submissions: &mut [Submission]) {
    submissions.sort_by(|a, b| {
        a.submitted_at()
            .cmp(&b.submitted_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}

#[async_trait]
impl SubmissionRepository for StoreSubmissionRepository {
    async fn get(&self, id: &str) -> EngineResult<Submission> {
        self.store
            .fetch::<Submission>(id)
            .await?
            .ok_or_else(|| EngineError::not_found(Submission::ENTITY, id))
    }

    async fn list_pending(&self) -> EngineResult<Vec<Submission>> {
        self.list_where(|s| s.status() == SubmissionStatus::Pending)
            .await
    }

    async fn list_by_team(&self, team_id: &str) -> EngineResult<Vec<Submission>> {
        self.list_where(|s| s.team_id() == team_id).await
    }

    async fn list_all(&self) -> EngineResult<Vec<Submission>> {
        self.list_where(|_| true).await
    }

    async fn create(
        &self,
        team_id: &str,
        task_id: &str,
        content_ref: &str,
    ) -> EngineResult<Submission> {
        if self.store.fetch::<Team>(team_id).await?.is_none() {
            return Err(EngineError::not_found(Team::ENTITY, team_id));
        }
        if self.store.fetch::<Task>(task_id).await?.is_none() {
            return Err(EngineError::not_found(Task::ENTITY, task_id));
        }

        let (submission, event) = Submission::new(
            Uuid::new_v4().to_string(),
            team_id,
            task_id,
            content_ref,
            Utc::now(),
        )?;

        self.store.put(&submission).await?;
        tracing::info!(
            submission_id = event.submission_id(),
            team_id,
            task_id,
            "Submission {}",
            event.kind()
        );

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::Criterion;
    use crate::domain::repositories::record_store::WriteBatch;
    use crate::infrastructure::repositories::MemoryRecordStore;
    use chrono::Duration;

    async fn seeded_store() -> Arc<dyn RecordStore> {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let team = Team::new("alpha", "Team Alpha", vec!["ada".to_string()]).unwrap();
        let task = Task::new(
            "prototype",
            "Prototype Build",
            vec![Criterion::new("Innovation", 30), Criterion::new("Execution", 20)],
        )
        .unwrap();

        let now = Utc::now();
        let (late, _) =
            Submission::new("S2", "alpha", "prototype", "repo://late", now).unwrap();
        let (early, _) = Submission::new(
            "S3",
            "alpha",
            "prototype",
            "repo://early",
            now - Duration::hours(2),
        )
        .unwrap();
        let (mut done, _) = Submission::new(
            "S1",
            "alpha",
            "prototype",
            "repo://done",
            now - Duration::hours(5),
        )
        .unwrap();
        done.reject("Duplicate entry".to_string(), now).unwrap();

        let batch = WriteBatch::new()
            .put(&team)
            .unwrap()
            .put(&task)
            .unwrap()
            .put(&late)
            .unwrap()
            .put(&early)
            .unwrap()
            .put(&done)
            .unwrap();
        store.apply(batch).await.unwrap();
        store
    }

    #[tokio::test]
    async fn pending_list_is_oldest_first() {
        let repo = StoreSubmissionRepository::new(seeded_store().await);

        let pending = repo.list_pending().await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|s| s.id()).collect();

        assert_eq!(ids, vec!["S3", "S2"]);
    }

    #[tokio::test]
    async fn list_all_includes_terminal_submissions() {
        let repo = StoreSubmissionRepository::new(seeded_store().await);

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id(), "S1");
        assert_eq!(repo.list_by_team("alpha").await.unwrap().len(), 3);
        assert!(repo.list_by_team("beta").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_submission_is_not_found() {
        let repo = StoreSubmissionRepository::new(seeded_store().await);

        match repo.get("nope").await {
            Err(EngineError::NotFound { entity, id }) => {
                assert_eq!(entity, "Submission");
                assert_eq!(id, "nope");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_requires_known_team_and_task() {
        let repo = StoreSubmissionRepository::new(seeded_store().await);

        assert!(matches!(
            repo.create("ghost", "prototype", "repo://x").await,
            Err(EngineError::NotFound { entity: "Team", .. })
        ));
        assert!(matches!(
            repo.create("alpha", "ghost", "repo://x").await,
            Err(EngineError::NotFound { entity: "Task", .. })
        ));
    }

    #[tokio::test]
    async fn created_submission_is_pending_and_listed() {
        let repo = StoreSubmissionRepository::new(seeded_store().await);

        let created = repo
            .create("alpha", "prototype", "repo://new")
            .await
            .unwrap();

        assert_eq!(created.status(), SubmissionStatus::Pending);
        assert_eq!(repo.get(created.id()).await.unwrap(), created);
        let pending = repo.list_pending().await.unwrap();
        assert_eq!(pending.last().unwrap().id(), created.id());
    }

    #[tokio::test]
    async fn create_rejects_empty_content() {
        let repo = StoreSubmissionRepository::new(seeded_store().await);

        assert!(matches!(
            repo.create("alpha", "prototype", " ").await,
            Err(EngineError::Validation { .. })
        ));
    }
}
