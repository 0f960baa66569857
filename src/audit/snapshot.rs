//! Flat, diff-comparable snapshots of auditable entities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// How a declared field participates in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain column value, copied as-is.
    Scalar,
    /// Structured JSON column, normalized to an object.
    Json,
    /// Single-valued relation, reduced to a stable string.
    Reference,
    /// Collection-valued relation; reported through relation events only.
    ManyToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
        }
    }

    pub const fn json(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Json,
        }
    }

    pub const fn reference(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Reference,
        }
    }

    pub const fn many_to_many(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::ManyToMany,
        }
    }
}

/// A value read from one field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(JsonValue),
    Json(Option<JsonValue>),
    /// Textual representation of the related entity, `None` when unset.
    Reference(Option<String>),
}

impl FieldValue {
    pub fn scalar<T: Serialize>(value: T) -> Self {
        FieldValue::Scalar(serde_json::to_value(value).unwrap_or(JsonValue::Null))
    }
}

/// One field could not be read. Recovered to `null` by the snapshotter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    Unknown(String),

    #[error("relation '{field}' could not be resolved: {reason}")]
    Unresolved { field: String, reason: String },

    #[error("field '{0}' is not readable")]
    Unreadable(String),
}

/// Capability an entity opts into to be audited.
///
/// `fields` lists declared fields only; computed properties stay out of it.
pub trait Auditable: Send + Sync {
    fn entity_type(&self) -> &str;

    fn entity_id(&self) -> i64;

    fn fields(&self) -> &'static [Field];

    fn field_value(&self, field: &Field) -> Result<FieldValue, FieldError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySnapshot(BTreeMap<String, JsonValue>);

impl EntitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: JsonValue) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<_, _>>(),
        )
    }
}

impl From<BTreeMap<String, JsonValue>> for EntitySnapshot {
    fn from(map: BTreeMap<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, JsonValue)> for EntitySnapshot {
    fn from_iter<I: IntoIterator<Item = (K, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySnapshotter;

impl EntitySnapshotter {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: unreadable fields degrade to `null`.
    pub fn snapshot(&self, entity: &dyn Auditable) -> EntitySnapshot {
        let mut snapshot = EntitySnapshot::new();
        for field in entity.fields() {
            if field.kind == FieldKind::ManyToMany {
                continue;
            }
            let value = match entity.field_value(field) {
                Ok(value) => normalize(value),
                Err(err) => {
                    tracing::debug!(
                        entity_type = entity.entity_type(),
                        entity_id = entity.entity_id(),
                        field = field.name,
                        error = %err,
                        "snapshot field unreadable, recording null"
                    );
                    JsonValue::Null
                }
            };
            snapshot.insert(field.name, value);
        }
        snapshot
    }
}

fn normalize(value: FieldValue) -> JsonValue {
    match value {
        FieldValue::Scalar(v) => v,
        FieldValue::Json(Some(JsonValue::Object(map))) => JsonValue::Object(map),
        FieldValue::Json(_) => JsonValue::Object(Map::new()),
        FieldValue::Reference(Some(text)) => JsonValue::String(text),
        FieldValue::Reference(None) => JsonValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Document {
        id: i64,
        title: String,
        owner: Result<Option<String>, FieldError>,
        settings: Option<JsonValue>,
    }

    static DOCUMENT_FIELDS: &[Field] = &[
        Field::scalar("id"),
        Field::scalar("title"),
        Field::reference("owner"),
        Field::json("settings"),
        Field::many_to_many("readers"),
        Field::scalar("missing"),
    ];

    impl Auditable for Document {
        fn entity_type(&self) -> &str {
            "Document"
        }

        fn entity_id(&self) -> i64 {
            self.id
        }

        fn fields(&self) -> &'static [Field] {
            DOCUMENT_FIELDS
        }

        fn field_value(&self, field: &Field) -> Result<FieldValue, FieldError> {
            match field.name {
                "id" => Ok(FieldValue::scalar(self.id)),
                "title" => Ok(FieldValue::scalar(&self.title)),
                "owner" => self.owner.clone().map(FieldValue::Reference),
                "settings" => Ok(FieldValue::Json(self.settings.clone())),
                "readers" => panic!("many-to-many fields must not be read"),
                other => Err(FieldError::Unknown(other.to_string())),
            }
        }
    }

    fn document() -> Document {
        Document {
            id: 7,
            title: "Quarterly report".into(),
            owner: Ok(Some("alice".into())),
            settings: Some(json!({"public": true})),
        }
    }

    #[test]
    fn copies_scalars_and_resolves_references() {
        let snap = EntitySnapshotter::new().snapshot(&document());
        assert_eq!(snap.get("id"), Some(&json!(7)));
        assert_eq!(snap.get("title"), Some(&json!("Quarterly report")));
        assert_eq!(snap.get("owner"), Some(&json!("alice")));
        assert_eq!(snap.get("settings"), Some(&json!({"public": true})));
    }

    #[test]
    fn skips_many_to_many_fields() {
        let snap = EntitySnapshotter::new().snapshot(&document());
        assert!(!snap.contains("readers"));
    }

    #[test]
    fn unreadable_fields_become_null_without_aborting() {
        let mut doc = document();
        doc.owner = Err(FieldError::Unresolved {
            field: "owner".into(),
            reason: "dangling reference".into(),
        });
        let snap = EntitySnapshotter::new().snapshot(&doc);
        assert_eq!(snap.get("owner"), Some(&JsonValue::Null));
        assert_eq!(snap.get("missing"), Some(&JsonValue::Null));
        assert_eq!(snap.get("title"), Some(&json!("Quarterly report")));
        assert_eq!(snap.len(), 5);
    }

    #[test]
    fn unset_reference_is_null() {
        let mut doc = document();
        doc.owner = Ok(None);
        let snap = EntitySnapshotter::new().snapshot(&doc);
        assert_eq!(snap.get("owner"), Some(&JsonValue::Null));
    }

    #[test]
    fn json_fields_fall_back_to_empty_object() {
        let mut doc = document();
        doc.settings = None;
        let snap = EntitySnapshotter::new().snapshot(&doc);
        assert_eq!(snap.get("settings"), Some(&json!({})));

        doc.settings = Some(json!([1, 2, 3]));
        let snap = EntitySnapshotter::new().snapshot(&doc);
        assert_eq!(snap.get("settings"), Some(&json!({})));
    }

    #[test]
    fn to_json_is_a_flat_object() {
        let snap = EntitySnapshotter::new().snapshot(&document());
        let value = snap.to_json();
        assert!(value.is_object());
        assert_eq!(value["title"], json!("Quarterly report"));
    }
}
