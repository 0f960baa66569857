//! Automatic audit trail for persisted entities.
//!
//! # Architecture
//!
//! - `ActorContext`: task-scoped identity of whoever is acting.
//! - `EntitySnapshotter`: turns any [`Auditable`] entity into a flat JSON map.
//! - `DiffEngine`: compares two snapshots field by field.
//! - `AuditRecorder`: handles one [`LifecycleEvent`] and appends one
//!   `OperationRecord` through an `OperationStore`.
//! - `EventBus`: fans lifecycle events out to listeners, the recorder being one.
//!
//! # Example
//!
//! ```rust,ignore
//! let recorder = Arc::new(AuditRecorder::new(store, fetcher, AuditSettings::default()));
//! let bus = EventBus::new().with_listener(recorder);
//!
//! ActorContext::scope(Some(Actor::new("user-7")), async {
//!     let row = insert_classification(&pool, "Invoices").await?;
//!     bus.publish(&LifecycleEvent::created(&row)).await
//! })
//! .await?;
//! ```

mod context;
mod diff;
mod events;
mod recorder;
mod snapshot;

pub use context::{Actor, ActorContext};
pub use diff::{ChangeSet, DiffEngine, FieldChange};
pub use events::{EventBus, LifecycleEvent, LifecycleListener, RelationAction};
pub use recorder::{AuditRecorder, AuditSettings, EntityFetcher, FailurePolicy};
pub use snapshot::{
    Auditable, EntitySnapshot, EntitySnapshotter, Field, FieldError, FieldKind, FieldValue,
};
