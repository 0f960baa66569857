use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::operation_record::{NewOperationRecord, OperationRecord};

/// Append-only storage for operation records. No update or delete exists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OperationStore: Send + Sync {
    async fn append(&self, record: NewOperationRecord) -> Result<OperationRecord>;

    /// Records of one entity instance, oldest first.
    async fn list_for_entity(&self, entity_type: &str, entity_id: i64)
        -> Result<Vec<OperationRecord>>;

    /// Most recent records, newest first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<OperationRecord>>;
}

#[derive(Clone)]
pub struct PgOperationStore {
    pool: PgPool,
}

impl PgOperationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OperationStore for PgOperationStore {
    async fn append(&self, record: NewOperationRecord) -> Result<OperationRecord> {
        let row = sqlx::query_as::<_, OperationRecord>(
            r#"
            INSERT INTO operation_records (actor_id, entity_type, entity_id, operation, occurred_at, changes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, actor_id, entity_type, entity_id, operation, occurred_at, changes
            "#,
        )
        .bind(record.actor_id)
        .bind(record.entity_type)
        .bind(record.entity_id)
        .bind(record.operation.as_str())
        .bind(record.occurred_at)
        .bind(record.changes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Vec<OperationRecord>> {
        let rows = sqlx::query_as::<_, OperationRecord>(
            r#"
            SELECT id, actor_id, entity_type, entity_id, operation, occurred_at, changes
            FROM operation_records
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY id ASC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<OperationRecord>> {
        let rows = sqlx::query_as::<_, OperationRecord>(
            r#"
            SELECT id, actor_id, entity_type, entity_id, operation, occurred_at, changes
            FROM operation_records
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Process-local store, for embedding without a database and for tests.
#[derive(Default)]
pub struct MemoryOperationStore {
    records: Mutex<Vec<OperationRecord>>,
}

impl MemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<OperationRecord>>> {
        self.records
            .lock()
            .map_err(|_| Error::Internal("operation store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl OperationStore for MemoryOperationStore {
    async fn append(&self, record: NewOperationRecord) -> Result<OperationRecord> {
        let mut records = self.lock()?;
        let stored = record.into_record(records.len() as i64 + 1);
        records.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Vec<OperationRecord>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| r.entity_type == entity_type && r.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<OperationRecord>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.lock()?.iter().rev().take(limit).cloned().collect())
    }
}
