use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use audit_trail_backend::audit::{
    Actor, ActorContext, AuditRecorder, AuditSettings, Auditable, EntityFetcher, EventBus,
    FailurePolicy, LifecycleEvent, RelationAction,
};
use audit_trail_backend::error::{Error, Result};
use audit_trail_backend::models::attachment::Attachment;
use audit_trail_backend::models::classification::Classification;
use audit_trail_backend::models::operation_record::{
    NewOperationRecord, OperationKind, OperationRecord,
};
use audit_trail_backend::services::operation_store::{MemoryOperationStore, OperationStore};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[derive(Default)]
struct StoredClassifications {
    rows: Mutex<HashMap<i64, Classification>>,
}

impl StoredClassifications {
    fn put(&self, row: Classification) {
        self.rows.lock().unwrap().insert(row.id, row);
    }
}

#[async_trait]
impl EntityFetcher for StoredClassifications {
    async fn fetch(&self, entity_type: &str, entity_id: i64) -> Result<Option<Box<dyn Auditable>>> {
        if entity_type != Classification::ENTITY_TYPE {
            return Ok(None);
        }
        let row = self.rows.lock().unwrap().get(&entity_id).cloned();
        Ok(row.map(|r| Box::new(r) as Box<dyn Auditable>))
    }
}

struct OfflineStore;

#[async_trait]
impl OperationStore for OfflineStore {
    async fn append(&self, _record: NewOperationRecord) -> Result<OperationRecord> {
        Err(Error::Internal("connection refused".into()))
    }

    async fn list_for_entity(&self, _: &str, _: i64) -> Result<Vec<OperationRecord>> {
        Ok(Vec::new())
    }

    async fn list_recent(&self, _: i64) -> Result<Vec<OperationRecord>> {
        Ok(Vec::new())
    }
}

fn classification(id: i64, name: &str) -> Classification {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    Classification {
        id,
        name: name.into(),
        lock_type: "full".into(),
        object_locked: false,
        universal_state: "active".into(),
        created_by: Some("u-1".into()),
        updated_by: Some("u-1".into()),
        created_at: at,
        updated_at: at,
    }
}

fn attachment(id: i64) -> Attachment {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    Attachment {
        id,
        file_path: "docs/report.pdf".into(),
        content_type: "invoice".into(),
        object_id: 11,
        classification_id: None,
        classification_name: None,
        created_by: None,
        updated_by: None,
        created_at: at,
        updated_at: at,
    }
}

struct Harness {
    store: Arc<MemoryOperationStore>,
    fetcher: Arc<StoredClassifications>,
    bus: EventBus,
}

fn harness(settings: AuditSettings) -> Harness {
    let store = Arc::new(MemoryOperationStore::new());
    let fetcher = Arc::new(StoredClassifications::default());
    let recorder = Arc::new(AuditRecorder::new(store.clone(), fetcher.clone(), settings));
    Harness {
        store,
        fetcher,
        bus: EventBus::new().with_listener(recorder),
    }
}

#[tokio::test]
async fn create_records_full_snapshot_with_actor() {
    let h = harness(AuditSettings::default());
    let row = classification(42, "Invoices");

    ActorContext::scope(Some(Actor::new("u-7")), async {
        h.bus.publish(&LifecycleEvent::created(&row)).await
    })
    .await
    .unwrap();

    let records = h.store.list_for_entity("Classification", 42).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.operation, OperationKind::Create);
    assert_eq!(record.actor_id.as_deref(), Some("u-7"));
    let snapshot = &record.changes.as_ref().unwrap()["new"];
    assert_eq!(snapshot["name"], json!("Invoices"));
    assert_eq!(snapshot["created_by"], json!("u-1"));
    assert_eq!(record.to_string(), "CREATE - Classification (42)");
}

#[tokio::test]
async fn update_records_only_changed_fields() {
    let h = harness(AuditSettings::default());
    let before = classification(42, "Invoices");
    h.fetcher.put(before.clone());

    let mut after = before.clone();
    after.name = "Receipts".into();
    after.object_locked = true;
    h.bus
        .publish(&LifecycleEvent::updated(&after, None))
        .await
        .unwrap();

    let records = h.store.list_for_entity("Classification", 42).await.unwrap();
    assert_eq!(
        records[0].changes,
        Some(json!({
            "name": {"before": "Invoices", "after": "Receipts"},
            "object_locked": {"before": false, "after": true},
        }))
    );
    assert_eq!(records[0].actor_id, None);
}

#[tokio::test]
async fn update_without_changes_records_empty_set() {
    let h = harness(AuditSettings::default());
    let row = classification(5, "Contracts");
    h.fetcher.put(row.clone());

    h.bus
        .publish(&LifecycleEvent::updated(&row, None))
        .await
        .unwrap();

    let records = h.store.list_for_entity("Classification", 5).await.unwrap();
    assert_eq!(records[0].operation, OperationKind::Update);
    assert_eq!(records[0].changes, Some(json!({})));
}

#[tokio::test]
async fn update_with_missing_before_state_records_empty_set() {
    let h = harness(AuditSettings::default());
    let row = classification(9, "Orphan");

    h.bus
        .publish(&LifecycleEvent::updated(&row, None))
        .await
        .unwrap();

    let records = h.store.list_for_entity("Classification", 9).await.unwrap();
    assert_eq!(records[0].changes, Some(json!({})));
}

#[tokio::test]
async fn delete_records_no_changes() {
    let h = harness(AuditSettings::default());
    let row = classification(3, "Archive");

    ActorContext::scope(Some(Actor::new("admin")), async {
        h.bus.publish(&LifecycleEvent::deleted(&row)).await
    })
    .await
    .unwrap();

    let records = h.store.list_for_entity("Classification", 3).await.unwrap();
    assert_eq!(records[0].operation, OperationKind::Delete);
    assert_eq!(records[0].changes, None);
    assert_eq!(records[0].actor_id.as_deref(), Some("admin"));
}

#[tokio::test]
async fn relation_changes_record_affected_ids() {
    let h = harness(AuditSettings::default());
    let row = attachment(1);

    h.bus
        .publish(&LifecycleEvent::relation_changed(
            &row,
            Attachment::TAGS_RELATION,
            Classification::ENTITY_TYPE,
            RelationAction::Add,
            vec![5, 6],
        ))
        .await
        .unwrap();
    h.bus
        .publish(&LifecycleEvent::relation_changed(
            &row,
            Attachment::TAGS_RELATION,
            Classification::ENTITY_TYPE,
            RelationAction::Clear,
            vec![5, 6],
        ))
        .await
        .unwrap();

    let records = h.store.list_for_entity("Attachment", 1).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].operation, OperationKind::M2mAdd);
    assert_eq!(
        records[0].changes,
        Some(json!({
            "related_entity_type": "Classification",
            "relation_name": "tags",
            "affected_ids": [5, 6],
        }))
    );
    assert_eq!(records[1].operation, OperationKind::M2mClear);
    assert_eq!(records[1].changes.as_ref().unwrap()["affected_ids"], json!([]));
}

#[tokio::test]
async fn operation_records_and_excluded_types_are_not_audited() {
    let h = harness(AuditSettings::default().with_excluded(["Attachment"]));
    let existing = h
        .store
        .append(NewOperationRecord {
            actor_id: None,
            entity_type: "Comment".into(),
            entity_id: 1,
            operation: OperationKind::Create,
            occurred_at: Utc::now(),
            changes: None,
        })
        .await
        .unwrap();

    h.bus
        .publish(&LifecycleEvent::created(&existing))
        .await
        .unwrap();
    h.bus
        .publish(&LifecycleEvent::created(&attachment(2)))
        .await
        .unwrap();

    assert_eq!(h.store.list_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn store_failure_follows_policy() {
    let row = classification(1, "Invoices");
    let fetcher = Arc::new(StoredClassifications::default());

    let open = AuditRecorder::new(
        Arc::new(OfflineStore),
        fetcher.clone(),
        AuditSettings::default(),
    );
    assert_eq!(open.record(&LifecycleEvent::created(&row)).await.unwrap(), None);

    let closed = AuditRecorder::new(
        Arc::new(OfflineStore),
        fetcher,
        AuditSettings::default().with_failure_policy(FailurePolicy::FailClosed),
    );
    let err = closed
        .record(&LifecycleEvent::created(&row))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuditPersistence(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_units_of_work_keep_their_own_actor() {
    let h = Arc::new(harness(AuditSettings::default()));

    let mut handles = Vec::new();
    for n in 0..16i64 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            let row = classification(n, "Shared");
            ActorContext::scope(Some(Actor::new(format!("user-{}", n))), async move {
                tokio::task::yield_now().await;
                h.bus.publish(&LifecycleEvent::created(&row)).await
            })
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for n in 0..16i64 {
        let records = h.store.list_for_entity("Classification", n).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].actor_id, Some(format!("user-{}", n)));
    }
}

#[test]
fn actor_is_gone_after_scope_ends() {
    let seen = tokio_test::block_on(ActorContext::scope(Some(Actor::new("u-1")), async {
        ActorContext::current()
    }));
    assert_eq!(seen, Some(Actor::new("u-1")));
    assert_eq!(ActorContext::current(), None);
}
