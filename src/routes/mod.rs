pub mod attachment;
pub mod classification;
pub mod comment;
pub mod docs;
pub mod health;
pub mod operation_log;

use axum::{
    routing::{get, post},
    Router,
};

use crate::middleware::actor::{bind_actor, new_actor_state};
use crate::AppState;

pub fn router(state: AppState, jwt_secret: &str) -> Router {
    let api = Router::new()
        .route(
            "/api/classifications",
            get(classification::list_classifications).post(classification::create_classification),
        )
        .route(
            "/api/classifications/:id",
            get(classification::get_classification)
                .patch(classification::update_classification)
                .delete(classification::delete_classification),
        )
        .route(
            "/api/classifications/:id/state",
            post(classification::transition_classification),
        )
        .route(
            "/api/attachments",
            get(attachment::list_attachments).post(attachment::create_attachment),
        )
        .route(
            "/api/attachments/:id",
            get(attachment::get_attachment)
                .patch(attachment::update_attachment)
                .delete(attachment::delete_attachment),
        )
        .route(
            "/api/attachments/:id/tags",
            get(attachment::list_tags)
                .post(attachment::add_tags)
                .delete(attachment::remove_tags),
        )
        .route(
            "/api/attachments/:id/tags/clear",
            post(attachment::clear_tags),
        )
        .route(
            "/api/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route(
            "/api/comments/:id",
            get(comment::get_comment)
                .patch(comment::update_comment)
                .delete(comment::delete_comment),
        )
        .route(
            "/api/operation-logs",
            get(operation_log::list_operation_logs),
        )
        .layer(axum::middleware::from_fn_with_state(
            new_actor_state(jwt_secret),
            bind_actor,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(docs::openapi))
        .merge(api)
        .with_state(state)
}
