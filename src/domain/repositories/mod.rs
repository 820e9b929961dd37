// Repository interfaces (ports)
// Implementations live in the infrastructure layer

pub mod record_store;
pub mod submission_repository;

pub use record_store::{Collection, Record, RecordStore, Snapshot, StoreError, WriteBatch};
pub use submission_repository::SubmissionRepository;
