use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::audit::{Auditable, Field, FieldError, FieldValue};
use crate::models::universal_state::UniversalState;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Classification {
    pub id: i64,
    pub name: String,
    pub lock_type: String,
    pub object_locked: bool,
    pub universal_state: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Classification {
    pub const ENTITY_TYPE: &'static str = "Classification";

    pub fn is_terminated(&self) -> bool {
        self.universal_state == UniversalState::Terminated.as_str()
    }
}

static CLASSIFICATION_FIELDS: &[Field] = &[
    Field::scalar("id"),
    Field::scalar("name"),
    Field::scalar("lock_type"),
    Field::scalar("object_locked"),
    Field::scalar("universal_state"),
    Field::reference("created_by"),
    Field::reference("updated_by"),
    Field::scalar("created_at"),
    Field::scalar("updated_at"),
];

impl Auditable for Classification {
    fn entity_type(&self) -> &str {
        Self::ENTITY_TYPE
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn fields(&self) -> &'static [Field] {
        CLASSIFICATION_FIELDS
    }

    fn field_value(&self, field: &Field) -> Result<FieldValue, FieldError> {
        Ok(match field.name {
            "id" => FieldValue::scalar(self.id),
            "name" => FieldValue::scalar(&self.name),
            "lock_type" => FieldValue::scalar(&self.lock_type),
            "object_locked" => FieldValue::scalar(self.object_locked),
            "universal_state" => FieldValue::scalar(&self.universal_state),
            "created_by" => FieldValue::Reference(self.created_by.clone()),
            "updated_by" => FieldValue::Reference(self.updated_by.clone()),
            "created_at" => FieldValue::scalar(self.created_at),
            "updated_at" => FieldValue::scalar(self.updated_at),
            other => return Err(FieldError::Unknown(other.to_string())),
        })
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
