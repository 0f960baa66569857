use serde::Deserialize;
use utoipa::IntoParams;

/// Generic relation target: the entity type name plus its id.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TargetQuery {
    pub content_type: String,
    pub object_id: i64,
}
