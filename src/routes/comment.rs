use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::comment_dto::{CreateCommentPayload, UpdateCommentPayload},
    dto::target_dto::TargetQuery,
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/comments",
    params(TargetQuery),
    responses(
        (status = 200, description = "Comments of one target", body = [Comment])
    )
)]
#[axum::debug_handler]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(target): Query<TargetQuery>,
) -> Result<impl IntoResponse> {
    let rows = state
        .comment_service
        .list_for_target(&target.content_type, target.object_id)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CreateCommentPayload,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_comment(
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let created = state.comment_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 404, description = "Comment not found")
    )
)]
#[axum::debug_handler]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let row = state.comment_service.get_by_id(id).await?;
    Ok(Json(row))
}

#[utoipa::path(
    patch,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    request_body = UpdateCommentPayload,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Comment not found")
    )
)]
#[axum::debug_handler]
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state.comment_service.update(id, payload).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 404, description = "Comment not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.comment_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
