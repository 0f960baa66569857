use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::audit::{Auditable, Field, FieldError, FieldValue};

/// A stored file attached to any entity through `content_type`/`object_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attachment {
    pub id: i64,
    pub file_path: String,
    pub content_type: String,
    pub object_id: i64,
    pub classification_id: Option<i64>,
    /// Joined from `classifications`; `None` if unset or dangling.
    pub classification_name: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    pub const ENTITY_TYPE: &'static str = "Attachment";
    pub const TAGS_RELATION: &'static str = "tags";

    fn classification_value(&self) -> Result<FieldValue, FieldError> {
        match (self.classification_id, &self.classification_name) {
            (None, _) => Ok(FieldValue::Reference(None)),
            (Some(_), Some(name)) => Ok(FieldValue::Reference(Some(name.clone()))),
            (Some(id), None) => Err(FieldError::Unresolved {
                field: "classification".to_string(),
                reason: format!("classification {} not found", id),
            }),
        }
    }
}

static ATTACHMENT_FIELDS: &[Field] = &[
    Field::scalar("id"),
    Field::scalar("file_path"),
    Field::scalar("content_type"),
    Field::scalar("object_id"),
    Field::reference("classification"),
    Field::many_to_many("tags"),
    Field::reference("created_by"),
    Field::reference("updated_by"),
    Field::scalar("created_at"),
    Field::scalar("updated_at"),
];

impl Auditable for Attachment {
    fn entity_type(&self) -> &str {
        Self::ENTITY_TYPE
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn fields(&self) -> &'static [Field] {
        ATTACHMENT_FIELDS
    }

    fn field_value(&self, field: &Field) -> Result<FieldValue, FieldError> {
        Ok(match field.name {
            "id" => FieldValue::scalar(self.id),
            "file_path" => FieldValue::scalar(&self.file_path),
            "content_type" => FieldValue::scalar(&self.content_type),
            "object_id" => FieldValue::scalar(self.object_id),
            "classification" => return self.classification_value(),
            "created_by" => FieldValue::Reference(self.created_by.clone()),
            "updated_by" => FieldValue::Reference(self.updated_by.clone()),
            "created_at" => FieldValue::scalar(self.created_at),
            "updated_at" => FieldValue::scalar(self.updated_at),
            other => return Err(FieldError::Unreadable(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::EntitySnapshotter;
    use serde_json::{json, Value as JsonValue};

    fn attachment() -> Attachment {
        Attachment {
            id: 3,
            file_path: "archivos/2024/01/02/invoice.pdf".into(),
            content_type: "Comment".into(),
            object_id: 11,
            classification_id: Some(5),
            classification_name: Some("Invoices".into()),
            created_by: Some("alice".into()),
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn classification_is_reduced_to_its_name() {
        let snap = EntitySnapshotter::new().snapshot(&attachment());
        assert_eq!(snap.get("classification"), Some(&json!("Invoices")));
        assert!(!snap.contains("tags"));
    }

    #[test]
    fn dangling_classification_is_null() {
        let mut a = attachment();
        a.classification_name = None;
        let snap = EntitySnapshotter::new().snapshot(&a);
        assert_eq!(snap.get("classification"), Some(&JsonValue::Null));
        assert_eq!(snap.get("file_path"), Some(&json!("archivos/2024/01/02/invoice.pdf")));
    }
}
