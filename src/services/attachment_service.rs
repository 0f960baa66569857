use sqlx::{PgExecutor, PgPool};

use crate::audit::{Actor, ActorContext, EntitySnapshotter, EventBus, LifecycleEvent, RelationAction};
use crate::dto::attachment_dto::{CreateAttachmentPayload, UpdateAttachmentPayload};
use crate::error::{Error, Result};
use crate::models::attachment::Attachment;
use crate::models::classification::Classification;

#[derive(Clone)]
pub struct AttachmentService {
    pool: PgPool,
    events: EventBus,
    snapshotter: EntitySnapshotter,
}

const ATTACHMENT_SELECT: &str = r#"
    SELECT a.id, a.file_path, a.content_type, a.object_id, a.classification_id,
           c.name AS classification_name,
           a.created_by, a.updated_by, a.created_at, a.updated_at
    FROM attachments a
    LEFT JOIN classifications c ON c.id = a.classification_id
"#;

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("Attachment {} not found", id))
}

impl AttachmentService {
    pub fn new(pool: PgPool, events: EventBus) -> Self {
        Self {
            pool,
            events,
            snapshotter: EntitySnapshotter::new(),
        }
    }

    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Attachment>> {
        let sql = format!("{} WHERE a.id = $1", ATTACHMENT_SELECT);
        let row = sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Attachment> {
        Self::find(&self.pool, id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list_for_target(
        &self,
        content_type: &str,
        object_id: i64,
    ) -> Result<Vec<Attachment>> {
        let sql = format!(
            "{} WHERE a.content_type = $1 AND a.object_id = $2 ORDER BY a.created_at DESC",
            ATTACHMENT_SELECT
        );
        let rows = sqlx::query_as::<_, Attachment>(&sql)
            .bind(content_type)
            .bind(object_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, payload: CreateAttachmentPayload) -> Result<Attachment> {
        let actor = ActorContext::current().map(Actor::into_inner);

        let mut tx = self.pool.begin().await?;
        if let Some(classification_id) = payload.classification_id {
            ensure_classifications(&mut *tx, &[classification_id]).await?;
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO attachments (file_path, content_type, object_id, classification_id, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id
            "#,
        )
        .bind(&payload.file_path)
        .bind(&payload.content_type)
        .bind(payload.object_id)
        .bind(payload.classification_id)
        .bind(&actor)
        .fetch_one(&mut *tx)
        .await?;
        let created = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;

        tx.commit().await?;
        self.events.publish(&LifecycleEvent::created(&created)).await?;
        Ok(created)
    }

    pub async fn update(&self, id: i64, payload: UpdateAttachmentPayload) -> Result<Attachment> {
        let actor = ActorContext::current().map(Actor::into_inner);

        let mut tx = self.pool.begin().await?;
        let before = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;
        let before_snapshot = self.snapshotter.snapshot(&before);
        // `Some(None)` unsets the classification, `None` leaves it as is.
        if let Some(Some(classification_id)) = payload.classification_id {
            ensure_classifications(&mut *tx, &[classification_id]).await?;
        }

        sqlx::query(
            r#"
            UPDATE attachments
            SET
                file_path = COALESCE($2, file_path),
                classification_id = CASE WHEN $3 THEN $4 ELSE classification_id END,
                updated_by = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.file_path)
        .bind(payload.classification_id.is_some())
        .bind(payload.classification_id.flatten())
        .bind(&actor)
        .execute(&mut *tx)
        .await?;
        let updated = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;

        tx.commit().await?;
        self.events
            .publish(&LifecycleEvent::updated(&updated, Some(before_snapshot)))
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let existing = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;

        sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.events.publish(&LifecycleEvent::deleted(&existing)).await?;
        Ok(())
    }

    pub async fn tags(&self, id: i64) -> Result<Vec<i64>> {
        self.get_by_id(id).await?;
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT classification_id FROM attachment_tags
            WHERE attachment_id = $1
            ORDER BY classification_id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Returns the ids that were not tagged before.
    pub async fn add_tags(&self, id: i64, classification_ids: Vec<i64>) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let attachment = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;
        ensure_classifications(&mut *tx, &classification_ids).await?;

        let mut added = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO attachment_tags (attachment_id, classification_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            RETURNING classification_id
            "#,
        )
        .bind(id)
        .bind(&classification_ids)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        added.sort_unstable();
        if !added.is_empty() {
            self.publish_tags(&attachment, RelationAction::Add, added.clone())
                .await?;
        }
        Ok(added)
    }

    /// Returns the ids that were actually untagged.
    pub async fn remove_tags(&self, id: i64, classification_ids: Vec<i64>) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let attachment = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;

        let mut removed = sqlx::query_scalar::<_, i64>(
            r#"
            DELETE FROM attachment_tags
            WHERE attachment_id = $1 AND classification_id = ANY($2)
            RETURNING classification_id
            "#,
        )
        .bind(id)
        .bind(&classification_ids)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        removed.sort_unstable();
        if !removed.is_empty() {
            self.publish_tags(&attachment, RelationAction::Remove, removed.clone())
                .await?;
        }
        Ok(removed)
    }

    pub async fn clear_tags(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let attachment = Self::find(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;

        sqlx::query("DELETE FROM attachment_tags WHERE attachment_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.publish_tags(&attachment, RelationAction::Clear, Vec::new())
            .await?;
        Ok(())
    }

    async fn publish_tags(
        &self,
        attachment: &Attachment,
        action: RelationAction,
        affected_ids: Vec<i64>,
    ) -> Result<()> {
        self.events
            .publish(&LifecycleEvent::relation_changed(
                attachment,
                Attachment::TAGS_RELATION,
                Classification::ENTITY_TYPE,
                action,
                affected_ids,
            ))
            .await
    }
}

async fn ensure_classifications<'e, E: PgExecutor<'e>>(executor: E, ids: &[i64]) -> Result<()> {
    let found: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT id) FROM classifications WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_one(executor)
    .await?;

    let mut wanted = ids.to_vec();
    wanted.sort_unstable();
    wanted.dedup();
    if found != wanted.len() as i64 {
        return Err(Error::BadRequest(
            "Unknown classification id in request".to_string(),
        ));
    }
    Ok(())
}
