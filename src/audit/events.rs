//! Typed lifecycle events and the listener bus that fans them out.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::snapshot::{Auditable, EntitySnapshot};
use crate::error::Result;
use crate::models::operation_record::OperationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationAction {
    Add,
    Remove,
    Clear,
}

impl RelationAction {
    pub fn operation(&self) -> OperationKind {
        match self {
            RelationAction::Add => OperationKind::M2mAdd,
            RelationAction::Remove => OperationKind::M2mRemove,
            RelationAction::Clear => OperationKind::M2mClear,
        }
    }
}

/// A mutation the host has applied (or is applying) to an entity.
pub enum LifecycleEvent<'a> {
    Created {
        entity: &'a dyn Auditable,
    },
    /// `before` is the snapshot captured ahead of the write, when the host
    /// has one. Without it the prior state is re-fetched by id.
    Updated {
        entity: &'a dyn Auditable,
        before: Option<EntitySnapshot>,
    },
    Deleted {
        entity: &'a dyn Auditable,
    },
    RelationChanged {
        entity: &'a dyn Auditable,
        relation: &'a str,
        related_entity_type: &'a str,
        action: RelationAction,
        affected_ids: Vec<i64>,
    },
}

impl<'a> LifecycleEvent<'a> {
    pub fn created(entity: &'a dyn Auditable) -> Self {
        LifecycleEvent::Created { entity }
    }

    pub fn updated(entity: &'a dyn Auditable, before: Option<EntitySnapshot>) -> Self {
        LifecycleEvent::Updated { entity, before }
    }

    pub fn deleted(entity: &'a dyn Auditable) -> Self {
        LifecycleEvent::Deleted { entity }
    }

    pub fn relation_changed(
        entity: &'a dyn Auditable,
        relation: &'a str,
        related_entity_type: &'a str,
        action: RelationAction,
        affected_ids: Vec<i64>,
    ) -> Self {
        LifecycleEvent::RelationChanged {
            entity,
            relation,
            related_entity_type,
            action,
            affected_ids,
        }
    }

    pub fn entity(&self) -> &'a dyn Auditable {
        match self {
            LifecycleEvent::Created { entity }
            | LifecycleEvent::Updated { entity, .. }
            | LifecycleEvent::Deleted { entity }
            | LifecycleEvent::RelationChanged { entity, .. } => *entity,
        }
    }

    pub fn operation(&self) -> OperationKind {
        match self {
            LifecycleEvent::Created { .. } => OperationKind::Create,
            LifecycleEvent::Updated { .. } => OperationKind::Update,
            LifecycleEvent::Deleted { .. } => OperationKind::Delete,
            LifecycleEvent::RelationChanged { action, .. } => action.operation(),
        }
    }
}

#[async_trait]
pub trait LifecycleListener: Send + Sync {
    fn name(&self) -> &str;

    async fn on_event(&self, event: &LifecycleEvent<'_>) -> Result<()>;
}

/// Dispatches each event to every subscribed listener in registration order.
///
/// A failing listener does not stop the others; the first failure is handed
/// back to the publisher once all listeners ran.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn LifecycleListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn LifecycleListener>) {
        tracing::debug!(listener = listener.name(), "lifecycle listener registered");
        self.listeners.push(listener);
    }

    pub fn with_listener(mut self, listener: Arc<dyn LifecycleListener>) -> Self {
        self.subscribe(listener);
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub async fn publish(&self, event: &LifecycleEvent<'_>) -> Result<()> {
        let entity = event.entity();
        let mut first_error = None;

        for listener in &self.listeners {
            if let Err(err) = listener.on_event(event).await {
                tracing::error!(
                    listener = listener.name(),
                    entity_type = entity.entity_type(),
                    entity_id = entity.entity_id(),
                    operation = %event.operation(),
                    error = ?err,
                    "lifecycle listener failed"
                );
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::snapshot::{Field, FieldError, FieldValue};
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Widget;

    impl Auditable for Widget {
        fn entity_type(&self) -> &str {
            "Widget"
        }

        fn entity_id(&self) -> i64 {
            1
        }

        fn fields(&self) -> &'static [Field] {
            &[]
        }

        fn field_value(&self, field: &Field) -> std::result::Result<FieldValue, FieldError> {
            Err(FieldError::Unknown(field.name.to_string()))
        }
    }

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LifecycleListener for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn on_event(&self, _event: &LifecycleEvent<'_>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Internal("listener down".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn relation_actions_map_to_operations() {
        assert_eq!(RelationAction::Add.operation(), OperationKind::M2mAdd);
        assert_eq!(RelationAction::Remove.operation(), OperationKind::M2mRemove);
        assert_eq!(RelationAction::Clear.operation(), OperationKind::M2mClear);
    }

    #[tokio::test]
    async fn failing_listener_does_not_starve_the_rest() {
        let failing = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let healthy = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let bus = EventBus::new()
            .with_listener(failing.clone())
            .with_listener(healthy.clone());

        let widget = Widget;
        let result = bus.publish(&LifecycleEvent::created(&widget)).await;

        assert!(result.is_err());
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_bus_publishes_nothing() {
        let widget = Widget;
        let bus = EventBus::new();
        assert_eq!(bus.listener_count(), 0);
        bus.publish(&LifecycleEvent::deleted(&widget)).await.unwrap();
    }
}
