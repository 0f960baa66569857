use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAttachmentPayload {
    #[validate(length(min = 1, max = 255))]
    pub file_path: String,
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
    #[validate(range(min = 0))]
    pub object_id: i64,
    pub classification_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAttachmentPayload {
    #[validate(length(min = 1, max = 255))]
    pub file_path: Option<String>,
    /// Omitted keeps the current classification, `null` removes it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<i64>, nullable)]
    pub classification_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TagsPayload {
    #[validate(length(min = 1))]
    pub classification_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagsResponse {
    pub attachment_id: i64,
    pub classification_ids: Vec<i64>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
