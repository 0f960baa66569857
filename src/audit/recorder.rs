//! Turns one lifecycle event into one persisted operation record.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use super::context::ActorContext;
use super::diff::DiffEngine;
use super::events::{LifecycleEvent, LifecycleListener, RelationAction};
use super::snapshot::{Auditable, EntitySnapshot, EntitySnapshotter};
use crate::error::{Error, Result};
use crate::models::operation_record::{NewOperationRecord, OperationRecord, OPERATION_RECORD_ENTITY};
use crate::services::operation_store::OperationStore;
use crate::utils::time;

/// Re-reads the persisted state of an entity by type and id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    /// `Ok(None)` when no such instance exists.
    async fn fetch(&self, entity_type: &str, entity_id: i64) -> Result<Option<Box<dyn Auditable>>>;
}

/// What happens when the audit path itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log and skip the record; the business operation is unaffected.
    #[default]
    FailOpen,
    /// Hand the error back to the host, which may reject the operation.
    FailClosed,
}

#[derive(Debug, Clone, Default)]
pub struct AuditSettings {
    pub failure_policy: FailurePolicy,
    pub excluded_entities: BTreeSet<String>,
}

impl AuditSettings {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_excluded<I, S>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_entities
            .extend(entity_types.into_iter().map(Into::into));
        self
    }
}

#[derive(Serialize)]
struct RelationChange<'a> {
    related_entity_type: &'a str,
    relation_name: &'a str,
    affected_ids: &'a [i64],
}

#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn OperationStore>,
    fetcher: Arc<dyn EntityFetcher>,
    snapshotter: EntitySnapshotter,
    differ: DiffEngine,
    settings: AuditSettings,
}

impl AuditRecorder {
    pub fn new(
        store: Arc<dyn OperationStore>,
        fetcher: Arc<dyn EntityFetcher>,
        settings: AuditSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            snapshotter: EntitySnapshotter::new(),
            differ: DiffEngine::new(),
            settings,
        }
    }

    pub fn snapshotter(&self) -> &EntitySnapshotter {
        &self.snapshotter
    }

    pub fn is_audited(&self, entity_type: &str) -> bool {
        entity_type != OPERATION_RECORD_ENTITY
            && !self.settings.excluded_entities.contains(entity_type)
    }

    /// Records `event`. Returns `Ok(None)` when nothing was written, either
    /// because the entity type is excluded or because auditing failed under
    /// [`FailurePolicy::FailOpen`].
    pub async fn record(&self, event: &LifecycleEvent<'_>) -> Result<Option<OperationRecord>> {
        let entity = event.entity();
        if !self.is_audited(entity.entity_type()) {
            tracing::trace!(entity_type = entity.entity_type(), "entity type not audited");
            return Ok(None);
        }

        let actor = ActorContext::current();

        let changes = match self.changes_for(event).await {
            Ok(changes) => changes,
            Err(err) => return self.degrade(event, err),
        };

        let record = NewOperationRecord {
            actor_id: actor.map(|a| a.into_inner()),
            entity_type: entity.entity_type().to_string(),
            entity_id: entity.entity_id(),
            operation: event.operation(),
            occurred_at: time::now(),
            changes,
        };

        match self.store.append(record).await {
            Ok(stored) => {
                tracing::debug!(
                    record_id = stored.id,
                    entity_type = %stored.entity_type,
                    entity_id = stored.entity_id,
                    operation = %stored.operation,
                    actor = ?stored.actor_id,
                    "operation recorded"
                );
                Ok(Some(stored))
            }
            Err(err) => self.degrade(event, Error::AuditPersistence(err.to_string())),
        }
    }

    async fn changes_for(&self, event: &LifecycleEvent<'_>) -> Result<Option<JsonValue>> {
        match event {
            LifecycleEvent::Created { entity } => {
                let snapshot = self.snapshotter.snapshot(*entity);
                Ok(Some(json!({ "new": snapshot.to_json() })))
            }
            LifecycleEvent::Updated { entity, before } => {
                let before = match before {
                    Some(snapshot) => snapshot.clone(),
                    None => match self.fetch_before(*entity).await? {
                        Some(snapshot) => snapshot,
                        None => return Ok(Some(json!({}))),
                    },
                };
                let after = self.snapshotter.snapshot(*entity);
                Ok(Some(self.differ.diff(&before, &after).to_json()))
            }
            LifecycleEvent::Deleted { .. } => Ok(None),
            LifecycleEvent::RelationChanged {
                relation,
                related_entity_type,
                action,
                affected_ids,
                ..
            } => {
                let affected: &[i64] = match action {
                    RelationAction::Clear => &[],
                    _ => affected_ids.as_slice(),
                };
                let payload = RelationChange {
                    related_entity_type: *related_entity_type,
                    relation_name: *relation,
                    affected_ids: affected,
                };
                Ok(Some(serde_json::to_value(payload)?))
            }
        }
    }

    /// Prior state read from durable storage at event time. Concurrent writers
    /// may already be reflected in it.
    async fn fetch_before(&self, entity: &dyn Auditable) -> Result<Option<EntitySnapshot>> {
        let fetched = match self
            .fetcher
            .fetch(entity.entity_type(), entity.entity_id())
            .await
        {
            Ok(fetched) => fetched,
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };

        match fetched {
            Some(previous) => Ok(Some(self.snapshotter.snapshot(previous.as_ref()))),
            None => {
                tracing::debug!(
                    entity_type = entity.entity_type(),
                    entity_id = entity.entity_id(),
                    "before state missing, recording empty change set"
                );
                Ok(None)
            }
        }
    }

    fn degrade(&self, event: &LifecycleEvent<'_>, err: Error) -> Result<Option<OperationRecord>> {
        let entity = event.entity();
        match self.settings.failure_policy {
            FailurePolicy::FailOpen => {
                tracing::warn!(
                    entity_type = entity.entity_type(),
                    entity_id = entity.entity_id(),
                    operation = %event.operation(),
                    error = %err,
                    "audit record skipped"
                );
                Ok(None)
            }
            FailurePolicy::FailClosed => {
                tracing::error!(
                    entity_type = entity.entity_type(),
                    entity_id = entity.entity_id(),
                    operation = %event.operation(),
                    error = %err,
                    "audit record failed"
                );
                Err(err)
            }
        }
    }
}

#[async_trait]
impl LifecycleListener for AuditRecorder {
    fn name(&self) -> &str {
        "audit_recorder"
    }

    async fn on_event(&self, event: &LifecycleEvent<'_>) -> Result<()> {
        self.record(event).await.map(|_| ())
    }
}
