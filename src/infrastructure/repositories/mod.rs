// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod memory_record_store;
pub mod postgres_record_store;
pub mod store_submission_repository;

pub use memory_record_store::MemoryRecordStore;
pub use postgres_record_store::PostgresRecordStore;
pub use store_submission_repository::StoreSubmissionRepository;
