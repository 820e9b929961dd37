use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use crate::domain::repositories::record_store::{
    Collection, Guard, RecordStore, Snapshot, StoreError, WriteBatch,
};

/// Advisory lock key serializing default-data seeding across processes
const SEED_LOCK_KEY: i64 = 0x6a75_6467_6573_6564;

/// PostgreSQL implementation of RecordStore
///
/// Each collection is a table of `(id TEXT PRIMARY KEY, record JSONB)`.
/// Batches run inside one transaction; guarded rows are locked with
/// `SELECT ... FOR UPDATE` before any write.
pub struct PostgresRecordStore {
    pool: PgPool,
}

fn backend(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::Backend(format!("{}: {}", context, e))
}

impl PostgresRecordStore {
    /// Creates a new PostgresRecordStore
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool and makes sure every collection table exists
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(backend("Failed to connect to database"))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the collection tables if they are missing
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    record JSONB NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
                collection.as_str()
            );
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(backend("Failed to create collection table"))?;
        }
        Ok(())
    }

    async fn check_guard(conn: &mut PgConnection, guard: &Guard) -> Result<(), StoreError> {
        let sql = format!(
            "SELECT record FROM {} WHERE id = $1 FOR UPDATE",
            guard.collection.as_str()
        );
        let current: Option<Value> = sqlx::query_scalar(&sql)
            .bind(&guard.id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(backend("Failed to lock guarded record"))?;

        if !guard.holds(current.as_ref()) {
            return Err(StoreError::PreconditionFailed {
                collection: guard.collection,
                id: guard.id.clone(),
            });
        }
        Ok(())
    }

    async fn write_puts(conn: &mut PgConnection, batch: &WriteBatch) -> Result<(), StoreError> {
        for put in batch.puts() {
            let sql = format!(
                r#"
                INSERT INTO {} (id, record)
                VALUES ($1, $2)
                ON CONFLICT (id) DO UPDATE SET
                    record = EXCLUDED.record,
                    updated_at = NOW()
                "#,
                put.collection.as_str()
            );
            sqlx::query(&sql)
                .bind(&put.id)
                .bind(&put.record)
                .execute(&mut *conn)
                .await
                .map_err(backend("Failed to save record"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let sql = format!("SELECT record FROM {} WHERE id = $1", collection.as_str());
        sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend("Failed to find record by id"))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let sql = format!("SELECT record FROM {} ORDER BY id", collection.as_str());
        sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend("Failed to list records"))
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() && batch.guards().is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(backend("Failed to begin transaction"))?;

        for guard in batch.guards() {
            // Dropping the transaction rolls it back
            Self::check_guard(&mut tx, guard).await?;
        }
        Self::write_puts(&mut tx, &batch).await?;

        tx.commit()
            .await
            .map_err(backend("Failed to commit transaction"))
    }

    async fn seed_if_empty(&self, batch: WriteBatch) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(backend("Failed to begin transaction"))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SEED_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(backend("Failed to acquire seed lock"))?;

        for collection in Collection::ALL {
            let sql = format!("SELECT EXISTS (SELECT 1 FROM {})", collection.as_str());
            let populated: bool = sqlx::query_scalar(&sql)
                .fetch_one(&mut *tx)
                .await
                .map_err(backend("Failed to inspect collection"))?;
            if populated {
                return Ok(false);
            }
        }

        Self::write_puts(&mut tx, &batch).await?;
        tx.commit()
            .await
            .map_err(backend("Failed to commit seed data"))?;

        Ok(true)
    }

    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(backend("Failed to begin transaction"))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(backend("Failed to start snapshot"))?;

        let mut snapshot = Snapshot::default();
        for collection in Collection::ALL {
            let sql = format!("SELECT id, record FROM {} ORDER BY id", collection.as_str());
            let rows: Vec<(String, Value)> = sqlx::query_as(&sql)
                .fetch_all(&mut *tx)
                .await
                .map_err(backend("Failed to read snapshot"))?;
            for (id, record) in rows {
                snapshot.insert_raw(collection, id, record);
            }
        }

        tx.commit()
            .await
            .map_err(backend("Failed to finish snapshot"))?;

        Ok(snapshot)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}
