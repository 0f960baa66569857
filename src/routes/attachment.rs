use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::attachment_dto::{
        CreateAttachmentPayload, TagsPayload, TagsResponse, UpdateAttachmentPayload,
    },
    dto::target_dto::TargetQuery,
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/attachments",
    params(TargetQuery),
    responses(
        (status = 200, description = "Attachments of one target", body = [Attachment])
    )
)]
#[axum::debug_handler]
pub async fn list_attachments(
    State(state): State<AppState>,
    Query(target): Query<TargetQuery>,
) -> Result<impl IntoResponse> {
    let rows = state
        .attachment_service
        .list_for_target(&target.content_type, target.object_id)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/attachments",
    request_body = CreateAttachmentPayload,
    responses(
        (status = 201, description = "Attachment created", body = Attachment),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_attachment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAttachmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let created = state.attachment_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/attachments/{id}",
    params(("id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment", body = Attachment),
        (status = 404, description = "Attachment not found")
    )
)]
#[axum::debug_handler]
pub async fn get_attachment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let row = state.attachment_service.get_by_id(id).await?;
    Ok(Json(row))
}

#[utoipa::path(
    patch,
    path = "/api/attachments/{id}",
    params(("id" = i64, Path, description = "Attachment id")),
    request_body = UpdateAttachmentPayload,
    responses(
        (status = 200, description = "Attachment updated", body = Attachment),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Attachment not found")
    )
)]
#[axum::debug_handler]
pub async fn update_attachment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAttachmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state.attachment_service.update(id, payload).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/attachments/{id}",
    params(("id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 404, description = "Attachment not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.attachment_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/attachments/{id}/tags",
    params(("id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Tag classification ids", body = TagsResponse),
        (status = 404, description = "Attachment not found")
    )
)]
#[axum::debug_handler]
pub async fn list_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let classification_ids = state.attachment_service.tags(id).await?;
    Ok(Json(TagsResponse {
        attachment_id: id,
        classification_ids,
    }))
}

#[utoipa::path(
    post,
    path = "/api/attachments/{id}/tags",
    params(("id" = i64, Path, description = "Attachment id")),
    request_body = TagsPayload,
    responses(
        (status = 200, description = "Newly added tag ids", body = TagsResponse),
        (status = 400, description = "Unknown classification"),
        (status = 404, description = "Attachment not found")
    )
)]
#[axum::debug_handler]
pub async fn add_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TagsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let classification_ids = state
        .attachment_service
        .add_tags(id, payload.classification_ids)
        .await?;
    Ok(Json(TagsResponse {
        attachment_id: id,
        classification_ids,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/attachments/{id}/tags",
    params(("id" = i64, Path, description = "Attachment id")),
    request_body = TagsPayload,
    responses(
        (status = 200, description = "Removed tag ids", body = TagsResponse),
        (status = 404, description = "Attachment not found")
    )
)]
#[axum::debug_handler]
pub async fn remove_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TagsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let classification_ids = state
        .attachment_service
        .remove_tags(id, payload.classification_ids)
        .await?;
    Ok(Json(TagsResponse {
        attachment_id: id,
        classification_ids,
    }))
}

#[utoipa::path(
    post,
    path = "/api/attachments/{id}/tags/clear",
    params(("id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 204, description = "All tags removed"),
        (status = 404, description = "Attachment not found")
    )
)]
#[axum::debug_handler]
pub async fn clear_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.attachment_service.clear_tags(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
