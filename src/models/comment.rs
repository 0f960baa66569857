use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::audit::{Auditable, Field, FieldError, FieldValue};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub content_type: String,
    pub object_id: i64,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub const ENTITY_TYPE: &'static str = "Comment";
}

static COMMENT_FIELDS: &[Field] = &[
    Field::scalar("id"),
    Field::scalar("body"),
    Field::scalar("content_type"),
    Field::scalar("object_id"),
    Field::json("metadata"),
    Field::reference("created_by"),
    Field::reference("updated_by"),
    Field::scalar("created_at"),
    Field::scalar("updated_at"),
];

impl Auditable for Comment {
    fn entity_type(&self) -> &str {
        Self::ENTITY_TYPE
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn fields(&self) -> &'static [Field] {
        COMMENT_FIELDS
    }

    fn field_value(&self, field: &Field) -> Result<FieldValue, FieldError> {
        Ok(match field.name {
            "id" => FieldValue::scalar(self.id),
            "body" => FieldValue::scalar(&self.body),
            "content_type" => FieldValue::scalar(&self.content_type),
            "object_id" => FieldValue::scalar(self.object_id),
            "metadata" => FieldValue::Json(self.metadata.clone()),
            "created_by" => FieldValue::Reference(self.created_by.clone()),
            "updated_by" => FieldValue::Reference(self.updated_by.clone()),
            "created_at" => FieldValue::scalar(self.created_at),
            "updated_at" => FieldValue::scalar(self.updated_at),
            other => return Err(FieldError::Unknown(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::EntitySnapshotter;
    use serde_json::json;

    fn comment(metadata: Option<JsonValue>) -> Comment {
        Comment {
            id: 1,
            body: "Looks fine".into(),
            content_type: "Attachment".into(),
            object_id: 1,
            metadata,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn metadata_snapshot_is_always_an_object() {
        let snapshotter = EntitySnapshotter::new();

        let empty = snapshotter.snapshot(&comment(None));
        assert_eq!(empty.get("metadata"), Some(&json!({})));

        let filled = snapshotter.snapshot(&comment(Some(json!({ "pinned": true }))));
        assert_eq!(filled.get("metadata"), Some(&json!({ "pinned": true })));
        assert_eq!(filled.get("created_by"), Some(&JsonValue::Null));
    }
}
