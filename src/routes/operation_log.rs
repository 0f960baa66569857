use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::operation_log_dto::{OperationLogQuery, OperationLogResponse},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/operation-logs",
    params(OperationLogQuery),
    responses(
        (status = 200, description = "Recorded operations", body = OperationLogResponse),
        (status = 400, description = "entity_type and entity_id must be given together")
    )
)]
#[axum::debug_handler]
pub async fn list_operation_logs(
    State(state): State<AppState>,
    Query(query): Query<OperationLogQuery>,
) -> Result<impl IntoResponse> {
    let records = match (query.entity_type.as_deref(), query.entity_id) {
        (Some(entity_type), Some(entity_id)) => {
            state
                .operation_store
                .list_for_entity(entity_type, entity_id)
                .await?
        }
        (None, None) => state.operation_store.list_recent(query.limit()).await?,
        _ => {
            return Err(Error::BadRequest(
                "entity_type and entity_id must be given together".to_string(),
            ))
        }
    };
    Ok(Json(OperationLogResponse::from(records)))
}
