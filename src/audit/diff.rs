//! Field-level diff between two snapshots.
//!
//! An absent key and an explicit `null` compare equal, so a field that only
//! exists on one side (schema drift) is reported only when the other side
//! carries a non-null value. Missing sides are reported as `null`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::snapshot::EntitySnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: JsonValue,
    pub after: JsonValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn diff(&self, before: &EntitySnapshot, after: &EntitySnapshot) -> ChangeSet {
        let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

        let changes = keys
            .into_iter()
            .filter_map(|key| {
                let old = before.get(key).unwrap_or(&JsonValue::Null);
                let new = after.get(key).unwrap_or(&JsonValue::Null);
                (old != new).then(|| {
                    (
                        key.clone(),
                        FieldChange {
                            before: old.clone(),
                            after: new.clone(),
                        },
                    )
                })
            })
            .collect();

        ChangeSet(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(value: JsonValue) -> EntitySnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let s = snap(json!({"name": "Checking", "balance": 1000, "meta": {"a": [1, 2]}}));
        assert!(DiffEngine::new().diff(&s, &s).is_empty());
    }

    #[test]
    fn reports_only_changed_fields() {
        let before = snap(json!({"a": 1, "b": 2, "c": 3}));
        let after = snap(json!({"a": 10, "b": 2, "c": 30}));

        let changes = DiffEngine::new().diff(&before, &after);
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes.get("a"),
            Some(&FieldChange {
                before: json!(1),
                after: json!(10)
            })
        );
        assert_eq!(changes.get("c").unwrap().after, json!(30));
        assert!(!changes.contains("b"));
    }

    #[test]
    fn field_added_reports_null_before() {
        let before = snap(json!({"name": "Test"}));
        let after = snap(json!({"name": "Test", "balance": 100}));

        let changes = DiffEngine::new().diff(&before, &after);
        let change = changes.get("balance").unwrap();
        assert_eq!(change.before, JsonValue::Null);
        assert_eq!(change.after, json!(100));
    }

    #[test]
    fn field_removed_reports_null_after() {
        let before = snap(json!({"name": "Test", "old_field": "value"}));
        let after = snap(json!({"name": "Test"}));

        let changes = DiffEngine::new().diff(&before, &after);
        assert_eq!(changes.get("old_field").unwrap().after, JsonValue::Null);
    }

    #[test]
    fn absent_and_null_compare_equal() {
        let before = snap(json!({"name": "Test", "note": null}));
        let after = snap(json!({"name": "Test"}));
        assert!(DiffEngine::new().diff(&before, &after).is_empty());
    }

    #[test]
    fn nested_objects_compare_structurally() {
        let before = snap(json!({"meta": {"tags": ["a"], "pinned": false}}));
        let same = snap(json!({"meta": {"pinned": false, "tags": ["a"]}}));
        let changed = snap(json!({"meta": {"pinned": true, "tags": ["a"]}}));

        let engine = DiffEngine::new();
        assert!(engine.diff(&before, &same).is_empty());
        assert!(engine.diff(&before, &changed).contains("meta"));
    }

    #[test]
    fn serializes_as_before_after_pairs() {
        let before = snap(json!({"name": "x"}));
        let after = snap(json!({"name": "y"}));

        let changes = DiffEngine::new().diff(&before, &after);
        assert_eq!(
            changes.to_json(),
            json!({"name": {"before": "x", "after": "y"}})
        );
    }
}
