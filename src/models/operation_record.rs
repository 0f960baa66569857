use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::audit::{Auditable, Field, FieldError, FieldValue};

/// Entity type name of the audit log itself; never audited.
pub const OPERATION_RECORD_ENTITY: &str = "OperationRecord";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    M2mAdd,
    M2mRemove,
    M2mClear,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::M2mAdd => "m2m_add",
            OperationKind::M2mRemove => "m2m_remove",
            OperationKind::M2mClear => "m2m_clear",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(OperationKind::Create),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            "m2m_add" => Ok(OperationKind::M2mAdd),
            "m2m_remove" => Ok(OperationKind::M2mRemove),
            "m2m_clear" => Ok(OperationKind::M2mClear),
            other => Err(format!("unknown operation kind '{}'", other)),
        }
    }
}

impl TryFrom<String> for OperationKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OperationRecord {
    pub id: i64,
    pub actor_id: Option<String>,
    pub entity_type: String,
    pub entity_id: i64,
    #[sqlx(try_from = "String")]
    pub operation: OperationKind,
    pub occurred_at: DateTime<Utc>,
    #[schema(value_type = Option<Object>)]
    pub changes: Option<JsonValue>,
}

/// An entry ready to be appended; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOperationRecord {
    pub actor_id: Option<String>,
    pub entity_type: String,
    pub entity_id: i64,
    pub operation: OperationKind,
    pub occurred_at: DateTime<Utc>,
    pub changes: Option<JsonValue>,
}

impl NewOperationRecord {
    pub fn into_record(self, id: i64) -> OperationRecord {
        OperationRecord {
            id,
            actor_id: self.actor_id,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            operation: self.operation,
            occurred_at: self.occurred_at,
            changes: self.changes,
        }
    }
}

impl std::fmt::Display for OperationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.operation.as_str().to_uppercase(),
            self.entity_type,
            self.entity_id
        )
    }
}

static OPERATION_RECORD_FIELDS: &[Field] = &[
    Field::scalar("id"),
    Field::scalar("actor_id"),
    Field::scalar("entity_type"),
    Field::scalar("entity_id"),
    Field::scalar("operation"),
    Field::scalar("occurred_at"),
    Field::json("changes"),
];

impl Auditable for OperationRecord {
    fn entity_type(&self) -> &str {
        OPERATION_RECORD_ENTITY
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn fields(&self) -> &'static [Field] {
        OPERATION_RECORD_FIELDS
    }

    fn field_value(&self, field: &Field) -> Result<FieldValue, FieldError> {
        Ok(match field.name {
            "id" => FieldValue::scalar(self.id),
            "actor_id" => FieldValue::scalar(&self.actor_id),
            "entity_type" => FieldValue::scalar(&self.entity_type),
            "entity_id" => FieldValue::scalar(self.entity_id),
            "operation" => FieldValue::scalar(self.operation),
            "occurred_at" => FieldValue::scalar(self.occurred_at),
            "changes" => FieldValue::Json(self.changes.clone()),
            other => return Err(FieldError::Unknown(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_kinds_use_wire_names() {
        assert_eq!(serde_json::to_value(OperationKind::M2mAdd).unwrap(), json!("m2m_add"));
        assert_eq!(
            serde_json::to_value(OperationKind::M2mClear).unwrap(),
            json!("m2m_clear")
        );
        for kind in [
            OperationKind::Create,
            OperationKind::Update,
            OperationKind::Delete,
            OperationKind::M2mAdd,
            OperationKind::M2mRemove,
            OperationKind::M2mClear,
        ] {
            assert_eq!(kind.as_str().parse::<OperationKind>(), Ok(kind));
        }
        assert!("truncate".parse::<OperationKind>().is_err());
    }

    #[test]
    fn display_matches_log_line_format() {
        let record = OperationRecord {
            id: 1,
            actor_id: None,
            entity_type: "Classification".into(),
            entity_id: 42,
            operation: OperationKind::Update,
            occurred_at: Utc::now(),
            changes: Some(json!({})),
        };
        assert_eq!(record.to_string(), "UPDATE - Classification (42)");
    }
}
