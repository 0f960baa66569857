//! Task-scoped "who is acting now".
//!
//! The binding lives in tokio task-local storage, so it follows one unit of
//! work across `.await` points and worker-thread migrations and is never seen
//! by another task, even one later scheduled on the same thread. A unit of
//! work is opened with [`ActorContext::scope`] (or [`ActorContext::sync_scope`]
//! for blocking code); the binding is dropped when the scope ends, whether the
//! inner future completes, returns an error, or panics.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

tokio::task_local! {
    static CURRENT_ACTOR: RefCell<Option<Actor>>;
}

/// Opaque identity attributed to a mutation (user id, service principal...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Actor {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Actor {
    fn from(id: String) -> Self {
        Self(id)
    }
}

pub struct ActorContext;

impl ActorContext {
    /// Run `fut` as one unit of work bound to `actor`.
    pub async fn scope<F>(actor: Option<Actor>, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_ACTOR.scope(RefCell::new(actor), fut).await
    }

    /// Blocking counterpart of [`ActorContext::scope`].
    pub fn sync_scope<R>(actor: Option<Actor>, f: impl FnOnce() -> R) -> R {
        CURRENT_ACTOR.sync_scope(RefCell::new(actor), f)
    }

    /// Rebind the current unit of work. Outside of a scope this binds nothing.
    pub fn set(actor: Actor) {
        let bound = CURRENT_ACTOR
            .try_with(|slot| {
                slot.replace(Some(actor));
            })
            .is_ok();
        if !bound {
            tracing::debug!("ActorContext::set called outside of a unit of work; ignored");
        }
    }

    pub fn current() -> Option<Actor> {
        CURRENT_ACTOR
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
    }

    pub fn clear() {
        let _ = CURRENT_ACTOR.try_with(|slot| slot.replace(None));
    }

    /// Whether the caller runs inside a unit of work at all.
    pub fn in_scope() -> bool {
        CURRENT_ACTOR.try_with(|_| ()).is_ok()
    }
}
