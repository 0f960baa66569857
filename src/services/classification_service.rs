use sqlx::{PgExecutor, PgPool};

use crate::audit::{Actor, ActorContext, EntitySnapshotter, EventBus, LifecycleEvent};
use crate::dto::classification_dto::{CreateClassificationPayload, UpdateClassificationPayload};
use crate::error::{Error, Result};
use crate::models::classification::Classification;
use crate::models::universal_state::StateTransition;

#[derive(Clone)]
pub struct ClassificationService {
    pool: PgPool,
    events: EventBus,
    snapshotter: EntitySnapshotter,
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("Classification {} not found", id))
}

impl ClassificationService {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        Self {
            pool,
            events,
            snapshotter: EntitySnapshotter::new(),
        }
    }

    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Classification>> {
        let row = sqlx::query_as::<_, Classification>(
            r#"
            SELECT id, name, lock_type, object_locked, universal_state,
                   created_by, updated_by, created_at, updated_at
            FROM classifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Classification> {
        Self::find(&self.pool, id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list(&self) -> Result<Vec<Classification>> {
        let rows = sqlx::query_as::<_, Classification>(
            r#"
            SELECT id, name, lock_type, object_locked, universal_state,
                   created_by, updated_by, created_at, updated_at
            FROM classifications
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, payload: CreateClassificationPayload) -> Result<Classification> {
        let actor = ActorContext::current().map(Actor::into_inner);
        let lock_type = payload.lock_type.unwrap_or_default();

        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Classification>(
            r#"
            INSERT INTO classifications (name, lock_type, created_by, updated_by)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, lock_type, object_locked, universal_state,
                      created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(&payload.name)
        .bind(lock_type.as_str())
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.events.publish(&LifecycleEvent::created(&created)).await?;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        payload: UpdateClassificationPayload,
    ) -> Result<Classification> {
        let actor = ActorContext::current().map(Actor::into_inner);

        let mut tx = self.pool.begin().await?;
        let before = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;
        let before_snapshot = self.snapshotter.snapshot(&before);

        let updated = sqlx::query_as::<_, Classification>(
            r#"
            UPDATE classifications
            SET
                name = COALESCE($2, name),
                lock_type = COALESCE($3, lock_type),
                object_locked = COALESCE($4, object_locked),
                updated_by = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, lock_type, object_locked, universal_state,
                      created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(payload.name)
        .bind(payload.lock_type.map(|l| l.as_str()))
        .bind(payload.object_locked)
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.events
            .publish(&LifecycleEvent::updated(&updated, Some(before_snapshot)))
            .await?;
        Ok(updated)
    }

    /// Moves the classification along its universal state. Terminated
    /// classifications accept no further transitions.
    pub async fn transition(&self, id: i64, transition: StateTransition) -> Result<Classification> {
        let actor = ActorContext::current().map(Actor::into_inner);

        let mut tx = self.pool.begin().await?;
        let before = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;
        if before.is_terminated() {
            return Err(Error::BadRequest(format!(
                "Classification {} is terminated",
                id
            )));
        }
        let before_snapshot = self.snapshotter.snapshot(&before);

        let updated = sqlx::query_as::<_, Classification>(
            r#"
            UPDATE classifications
            SET universal_state = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, lock_type, object_locked, universal_state,
                      created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(transition.target().as_str())
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.events
            .publish(&LifecycleEvent::updated(&updated, Some(before_snapshot)))
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let existing = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;

        sqlx::query("DELETE FROM classifications WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.events.publish(&LifecycleEvent::deleted(&existing)).await?;
        Ok(())
    }
}
