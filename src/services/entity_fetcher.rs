use async_trait::async_trait;
use sqlx::PgPool;

use crate::audit::{Auditable, EntityFetcher};
use crate::error::Result;
use crate::models::attachment::Attachment;
use crate::models::classification::Classification;
use crate::models::comment::Comment;
use crate::services::attachment_service::AttachmentService;
use crate::services::classification_service::ClassificationService;
use crate::services::comment_service::CommentService;

/// Reads the committed state of any audited table by entity type and id.
#[derive(Clone)]
pub struct PgEntityFetcher {
    pool: PgPool,
}

impl PgEntityFetcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn boxed<T: Auditable + 'static>(row: Option<T>) -> Option<Box<dyn Auditable>> {
    row.map(|r| Box::new(r) as Box<dyn Auditable>)
}

#[async_trait]
impl EntityFetcher for PgEntityFetcher {
    async fn fetch(&self, entity_type: &str, entity_id: i64) -> Result<Option<Box<dyn Auditable>>> {
        let found = match entity_type {
            Classification::ENTITY_TYPE => {
                boxed(ClassificationService::find(&self.pool, entity_id).await?)
            }
            Attachment::ENTITY_TYPE => boxed(AttachmentService::find(&self.pool, entity_id).await?),
            Comment::ENTITY_TYPE => boxed(CommentService::find(&self.pool, entity_id).await?),
            other => {
                tracing::debug!(entity_type = other, "no fetcher registered for entity type");
                None
            }
        };
        Ok(found)
    }
}
