use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCommentPayload {
    #[validate(length(min = 1))]
    pub body: String,
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
    #[validate(range(min = 0))]
    pub object_id: i64,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentPayload {
    #[validate(length(min = 1))]
    pub body: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
}
