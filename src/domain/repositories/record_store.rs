use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::score::Score;
use crate::domain::submission::Submission;
use crate::domain::task::Task;
use crate::domain::team::Team;

/// The four namespaced collections owned by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Teams,
    Tasks,
    Submissions,
    Scores,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Teams,
        Collection::Tasks,
        Collection::Submissions,
        Collection::Scores,
    ];

    /// Namespace name, also used as the table name by SQL backends
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Teams => "teams",
            Collection::Tasks => "tasks",
            Collection::Submissions => "submissions",
            Collection::Scores => "scores",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by record store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed {collection} record {id}: {reason}")]
    Corrupt {
        collection: Collection,
        id: String,
        reason: String,
    },

    #[error("Precondition failed for {collection} record {id}")]
    PreconditionFailed { collection: Collection, id: String },

    #[error("Record store is closed")]
    Closed,
}

/// An entity persisted in one of the store's collections
///
/// Records are stored as JSON documents keyed by `record_id`. Every load
/// goes through `decode`, so malformed documents never reach scoring logic.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Human readable entity name used in not-found errors
    const ENTITY: &'static str;

    fn record_id(&self) -> &str;

    /// Checks invariants that serde alone cannot express
    fn check_schema(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Deserializes and validates a stored document
pub fn decode<R: Record>(id: &str, value: Value) -> Result<R, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        collection: R::COLLECTION,
        id: id.to_string(),
        reason,
    };

    let record: R = serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
    if record.record_id() != id {
        return Err(corrupt(format!(
            "stored under key {} but carries id {}",
            id,
            record.record_id()
        )));
    }
    record.check_schema().map_err(corrupt)?;

    Ok(record)
}

/// A precondition checked atomically with a write batch
///
/// The guard holds when the stored record exists and its top-level `field`
/// equals `expected`.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    pub collection: Collection,
    pub id: String,
    pub field: String,
    pub expected: Value,
}

impl Guard {
    pub fn field_equals(
        collection: Collection,
        id: impl Into<String>,
        field: impl Into<String>,
        expected: Value,
    ) -> Self {
        Self {
            collection,
            id: id.into(),
            field: field.into(),
            expected,
        }
    }

    pub fn holds(&self, current: Option<&Value>) -> bool {
        current
            .and_then(|record| record.get(&self.field))
            .map_or(false, |value| value == &self.expected)
    }
}

/// A single upsert inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct Put {
    pub collection: Collection,
    pub id: String,
    pub record: Value,
}

/// Puts applied all-or-nothing, after every guard has been checked
///
/// # Example
/// ```
/// use judgeboard_api::domain::repositories::record_store::{Collection, Guard, WriteBatch};
/// use judgeboard_api::domain::Team;
///
/// let team = Team::new("alpha", "Team Alpha", vec!["ada".to_string()]).expect("valid team");
/// let batch = WriteBatch::new()
///     .guard(Guard::field_equals(
///         Collection::Teams,
///         "alpha",
///         "name",
///         serde_json::json!("Team Alpha"),
///     ))
///     .put(&team)
///     .expect("serializable");
///
/// assert_eq!(batch.puts().len(), 1);
/// assert_eq!(batch.guards().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    guards: Vec<Guard>,
    puts: Vec<Put>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an upsert of `record` into its collection
    pub fn put<R: Record>(mut self, record: &R) -> Result<Self, StoreError> {
        self.puts.push(Put {
            collection: R::COLLECTION,
            id: record.record_id().to_string(),
            record: serde_json::to_value(record)?,
        });
        Ok(self)
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn puts(&self) -> &[Put] {
        &self.puts
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }
}

/// A consistent copy of all four collections
///
/// Also the on-disk layout of the file-backed store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    teams: BTreeMap<String, Value>,
    #[serde(default)]
    tasks: BTreeMap<String, Value>,
    #[serde(default)]
    submissions: BTreeMap<String, Value>,
    #[serde(default)]
    scores: BTreeMap<String, Value>,
}

impl Snapshot {
    fn collection(&self, collection: Collection) -> &BTreeMap<String, Value> {
        match collection {
            Collection::Teams => &self.teams,
            Collection::Tasks => &self.tasks,
            Collection::Submissions => &self.submissions,
            Collection::Scores => &self.scores,
        }
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut BTreeMap<String, Value> {
        match collection {
            Collection::Teams => &mut self.teams,
            Collection::Tasks => &mut self.tasks,
            Collection::Submissions => &mut self.submissions,
            Collection::Scores => &mut self.scores,
        }
    }

    pub fn raw(&self, collection: Collection, id: &str) -> Option<&Value> {
        self.collection(collection).get(id)
    }

    /// Raw documents of a collection, ordered by id
    pub fn raw_records(&self, collection: Collection) -> Vec<Value> {
        self.collection(collection).values().cloned().collect()
    }

    pub fn insert_raw(&mut self, collection: Collection, id: impl Into<String>, record: Value) {
        self.collection_mut(collection).insert(id.into(), record);
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collection(collection).len()
    }

    pub fn is_empty(&self) -> bool {
        Collection::ALL.iter().all(|c| self.collection(*c).is_empty())
    }

    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.raw(R::COLLECTION, id)
            .map(|value| decode::<R>(id, value.clone()))
            .transpose()
    }

    /// Decoded records of a collection, ordered by id
    pub fn records<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.collection(R::COLLECTION)
            .iter()
            .map(|(id, value)| decode::<R>(id, value.clone()))
            .collect()
    }

    pub fn check_guards(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        for guard in batch.guards() {
            if !guard.holds(self.raw(guard.collection, &guard.id)) {
                return Err(StoreError::PreconditionFailed {
                    collection: guard.collection,
                    id: guard.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Checks guards, then applies every put; on error `self` is untouched
    pub fn apply(&mut self, batch: &WriteBatch) -> Result<(), StoreError> {
        self.check_guards(batch)?;
        for put in batch.puts() {
            self.insert_raw(put.collection, put.id.clone(), put.record.clone());
        }
        Ok(())
    }

    /// Decodes every stored document against its entity schema
    pub fn validate(&self) -> Result<(), StoreError> {
        self.records::<Team>()?;
        self.records::<Task>()?;
        self.records::<Submission>()?;
        self.records::<Score>()?;
        Ok(())
    }
}

/// Durable keyed storage for teams, tasks, submissions and scores
///
/// Implementations must apply each `WriteBatch` atomically: either every
/// guard holds and every put becomes visible together, or nothing changes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a raw document by collection and id
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    /// List all raw documents of a collection, ordered by id
    async fn list(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Apply a batch atomically
    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Apply a batch only if every collection is empty
    ///
    /// Returns whether the batch was applied.
    async fn seed_if_empty(&self, batch: WriteBatch) -> Result<bool, StoreError>;

    /// Consistent view of every collection
    async fn snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Release backend resources; later calls fail with `StoreError::Closed`
    async fn close(&self) -> Result<(), StoreError>;
}

impl dyn RecordStore {
    /// Fetch and decode a record
    pub async fn fetch<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.get(R::COLLECTION, id)
            .await?
            .map(|value| decode::<R>(id, value))
            .transpose()
    }

    /// Fetch and decode every record of a collection
    pub async fn fetch_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.list(R::COLLECTION)
            .await?
            .into_iter()
            .map(|value| {
                let id = value
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                decode::<R>(&id, value)
            })
            .collect()
    }

    /// Upsert a single record
    pub async fn put<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.apply(WriteBatch::new().put(record)?).await
    }
}
