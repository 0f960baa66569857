use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use super::auth::{bearer_token, decode_claims, unauthorized, BearerToken};
use crate::audit::{Actor, ActorContext};

#[derive(Clone)]
pub struct ActorLayerState {
    jwt_secret: Arc<str>,
}

pub fn new_actor_state(jwt_secret: &str) -> ActorLayerState {
    ActorLayerState {
        jwt_secret: Arc::from(jwt_secret),
    }
}

/// Opens one unit of work per request. A valid bearer token binds its `sub`
/// as the actor; no token leaves the request anonymous; a bad token is
/// rejected before the handler runs.
pub async fn bind_actor(
    State(state): State<ActorLayerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let decoded = match bearer_token(&req) {
        BearerToken::Missing => None,
        BearerToken::Rejected(code) => return unauthorized(code),
        BearerToken::Present(token) => Some(decode_claims(token, &state.jwt_secret)),
    };

    let actor = match decoded {
        None => None,
        Some(Ok(claims)) => {
            let actor = Actor::new(claims.sub.clone());
            req.extensions_mut().insert(claims);
            Some(actor)
        }
        Some(Err(err)) => {
            tracing::debug!(error = %err, "bearer token rejected");
            return unauthorized("invalid_token");
        }
    };

    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        actor = actor.as_ref().map(Actor::id).unwrap_or("-"),
    );

    ActorContext::scope(actor, next.run(req))
        .instrument(span)
        .await
}
