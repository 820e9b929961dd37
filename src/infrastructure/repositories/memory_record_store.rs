use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use atomic_write_file::AtomicWriteFile;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::repositories::record_store::{
    Collection, RecordStore, Snapshot, StoreError, WriteBatch,
};

/// In-process RecordStore, optionally mirrored to a JSON file
///
/// All collections sit behind one `RwLock`, so a batch becomes visible to
/// readers in a single step. When a snapshot file is configured, every
/// committed batch rewrites it atomically; if that write fails the
/// in-memory state is left as it was.
pub struct MemoryRecordStore {
    state: RwLock<Option<Snapshot>>,
    snapshot_file: Option<PathBuf>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    /// Creates an empty, purely in-memory store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Some(Snapshot::default())),
            snapshot_file: None,
        }
    }

    /// Opens a file-backed store, loading existing data if the file exists
    ///
    /// Every stored record is decoded against its schema; a malformed file
    /// fails here instead of surfacing later in scoring.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                snapshot.validate()?;
                tracing::info!(path = %path.display(), "Loaded record store snapshot");
                snapshot
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No snapshot file yet, starting empty");
                Snapshot::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            state: RwLock::new(Some(snapshot)),
            snapshot_file: Some(path),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let Some(path) = self.snapshot_file.clone() else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| StoreError::Backend(format!("Snapshot writer failed: {}", e)))??;
        Ok(())
    }

    /// Applies `batch` to a copy, persists the copy, then swaps it in
    async fn commit(&self, state: &mut Option<Snapshot>, batch: &WriteBatch) -> Result<(), StoreError> {
        let current = state.as_mut().ok_or(StoreError::Closed)?;

        if self.snapshot_file.is_none() {
            return current.apply(batch);
        }

        let mut next = current.clone();
        next.apply(batch)?;
        self.persist(&next).await?;
        *current = next;
        Ok(())
    }
}

/// Replaces `path` with `bytes`; readers see either the old or the new file
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = AtomicWriteFile::open(path)?;
    file.write_all(bytes)?;
    file.commit()?;
    Ok(())
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let state = self.state.read().await;
        let snapshot = state.as_ref().ok_or(StoreError::Closed)?;
        Ok(snapshot.raw(collection, id).cloned())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read().await;
        let snapshot = state.as_ref().ok_or(StoreError::Closed)?;
        Ok(snapshot.raw_records(collection))
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        self.commit(&mut state, &batch).await
    }

    async fn seed_if_empty(&self, batch: WriteBatch) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let populated = !state.as_ref().ok_or(StoreError::Closed)?.is_empty();
        if populated {
            return Ok(false);
        }
        self.commit(&mut state, &batch).await?;
        Ok(true)
    }

    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let state = self.state.read().await;
        state.as_ref().cloned().ok_or(StoreError::Closed)
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(snapshot) = state.as_ref() {
            self.persist(snapshot).await?;
        }
        *state = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::record_store::Guard;
    use crate::domain::Team;
    use serde_json::json;
    use std::sync::Arc;

    fn team(id: &str) -> Team {
        Team::new(id, format!("Team {}", id), vec!["ada".to_string()]).unwrap()
    }


    #[tokio::test]
    async fn put_then_fetch() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        store.put(&team("alpha")).await.unwrap();

        let found = store.fetch::<Team>("alpha").await.unwrap();
        assert_eq!(found.unwrap().name(), "Team alpha");
        assert!(store.fetch::<Team>("beta").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_guard_leaves_state_unchanged() {
        let store = MemoryRecordStore::new();
        let batch = WriteBatch::new()
            .guard(Guard::field_equals(
                Collection::Teams,
                "alpha",
                "name",
                json!("Team alpha"),
            ))
            .put(&team("beta"))
            .unwrap();

        let result = store.apply(batch).await;

        assert!(matches!(result, Err(StoreError::PreconditionFailed { .. })));
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_if_empty_only_once() {
        let store = MemoryRecordStore::new();

        let first = store
            .seed_if_empty(WriteBatch::new().put(&team("alpha")).unwrap())
            .await
            .unwrap();
        let second = store
            .seed_if_empty(WriteBatch::new().put(&team("beta")).unwrap())
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(Collection::Teams), 1);
        assert!(snapshot.raw(Collection::Teams, "beta").is_none());
    }

    #[tokio::test]
    async fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let store = MemoryRecordStore::open(&path).await.unwrap();
        store
            .apply(WriteBatch::new().put(&team("alpha")).unwrap())
            .await
            .unwrap();
        store.close().await.unwrap();

        let reopened = MemoryRecordStore::open(&path).await.unwrap();
        let snapshot = reopened.snapshot().await.unwrap();
        assert!(snapshot.raw(Collection::Teams, "alpha").is_some());
    }

    #[tokio::test]
    async fn stores_sharing_a_file_never_tear_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let first = Arc::new(MemoryRecordStore::open(&path).await.unwrap());
        let second = Arc::new(MemoryRecordStore::open(&path).await.unwrap());

        let writers: Vec<_> = [first, second]
            .into_iter()
            .enumerate()
            .map(|(n, store)| {
                tokio::spawn(async move {
                    for i in 0..20 {
                        let id = format!("w{}-{}", n, i);
                        store
                            .apply(WriteBatch::new().put(&team(&id)).unwrap())
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let reopened = MemoryRecordStore::open(&path).await.unwrap();
        assert_eq!(reopened.snapshot().await.unwrap().len(Collection::Teams), 20);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn failed_file_write_keeps_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("records.json");
        let store = MemoryRecordStore::open(&path).await.unwrap();

        let result = store
            .apply(WriteBatch::new().put(&team("alpha")).unwrap())
            .await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.get(Collection::Teams, "alpha").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_file_is_rejected_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, r#"{"teams": {"alpha": {"id": "alpha"}}}"#).unwrap();

        let result = MemoryRecordStore::open(&path).await;

        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn closed_store_refuses_access() {
        let store = MemoryRecordStore::new();
        store.close().await.unwrap();

        assert!(matches!(
            store.get(Collection::Teams, "alpha").await,
            Err(StoreError::Closed)
        ));
        assert!(matches!(
            store.apply(WriteBatch::new()).await,
            Err(StoreError::Closed)
        ));
    }
}
