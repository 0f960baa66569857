use sqlx::{PgExecutor, PgPool};

use crate::audit::{Actor, ActorContext, EntitySnapshotter, EventBus, LifecycleEvent};
use crate::dto::comment_dto::{CreateCommentPayload, UpdateCommentPayload};
use crate::error::{Error, Result};
use crate::models::comment::Comment;

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    events: EventBus,
    snapshotter: EntitySnapshotter,
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("Comment {} not found", id))
}

impl CommentService {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        Self {
            pool,
            events,
            snapshotter: EntitySnapshotter::new(),
        }
    }

    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, body, content_type, object_id, metadata,
                   created_by, updated_by, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Comment> {
        Self::find(&self.pool, id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list_for_target(&self, content_type: &str, object_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, body, content_type, object_id, metadata,
                   created_by, updated_by, created_at, updated_at
            FROM comments
            WHERE content_type = $1 AND object_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(content_type)
        .bind(object_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, payload: CreateCommentPayload) -> Result<Comment> {
        let actor = ActorContext::current().map(Actor::into_inner);

        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (body, content_type, object_id, metadata, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, body, content_type, object_id, metadata,
                      created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(&payload.body)
        .bind(&payload.content_type)
        .bind(payload.object_id)
        .bind(&payload.metadata)
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.events.publish(&LifecycleEvent::created(&created)).await?;
        Ok(created)
    }

    pub async fn update(&self, id: i64, payload: UpdateCommentPayload) -> Result<Comment> {
        let actor = ActorContext::current().map(Actor::into_inner);

        let mut tx = self.pool.begin().await?;
        let before = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;
        let before_snapshot = self.snapshotter.snapshot(&before);

        let updated = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET
                body = COALESCE($2, body),
                metadata = COALESCE($3, metadata),
                updated_by = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, body, content_type, object_id, metadata,
                      created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(payload.body)
        .bind(payload.metadata)
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

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.events.publish(&LifecycleEvent::deleted(&existing)).await?;
        Ok(())
    }
}
