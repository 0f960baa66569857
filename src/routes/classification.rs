use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::classification_dto::{
        CreateClassificationPayload, StateTransitionPayload, UpdateClassificationPayload,
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/classifications",
    responses(
        (status = 200, description = "All classifications", body = [Classification])
    )
)]
#[axum::debug_handler]
pub async fn list_classifications(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let rows = state.classification_service.list().await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/classifications",
    request_body = CreateClassificationPayload,
    responses(
        (status = 201, description = "Classification created", body = Classification),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_classification(
    State(state): State<AppState>,
    Json(payload): Json<CreateClassificationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let created = state.classification_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/classifications/{id}",
    params(("id" = i64, Path, description = "Classification id")),
    responses(
        (status = 200, description = "Classification", body = Classification),
        (status = 404, description = "Classification not found")
    )
)]
#[axum::debug_handler]
pub async fn get_classification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let row = state.classification_service.get_by_id(id).await?;
    Ok(Json(row))
}

#[utoipa::path(
    patch,
    path = "/api/classifications/{id}",
    params(("id" = i64, Path, description = "Classification id")),
    request_body = UpdateClassificationPayload,
    responses(
        (status = 200, description = "Classification updated", body = Classification),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Classification not found")
    )
)]
#[axum::debug_handler]
pub async fn update_classification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateClassificationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state.classification_service.update(id, payload).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/api/classifications/{id}/state",
    params(("id" = i64, Path, description = "Classification id")),
    request_body = StateTransitionPayload,
    responses(
        (status = 200, description = "State changed", body = Classification),
        (status = 400, description = "Classification is terminated"),
        (status = 404, description = "Classification not found")
    )
)]
#[axum::debug_handler]
pub async fn transition_classification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<StateTransitionPayload>,
) -> Result<impl IntoResponse> {
    let updated = state
        .classification_service
        .transition(id, payload.transition)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/classifications/{id}",
    params(("id" = i64, Path, description = "Classification id")),
    responses(
        (status = 204, description = "Classification deleted"),
        (status = 404, description = "Classification not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_classification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.classification_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
