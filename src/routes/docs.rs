use axum::Json;
use utoipa::OpenApi;

use crate::dto::attachment_dto::{
    CreateAttachmentPayload, TagsPayload, TagsResponse, UpdateAttachmentPayload,
};
use crate::dto::classification_dto::{
    CreateClassificationPayload, StateTransitionPayload, UpdateClassificationPayload,
};
use crate::dto::comment_dto::{CreateCommentPayload, UpdateCommentPayload};
use crate::dto::operation_log_dto::OperationLogResponse;
use crate::models::attachment::Attachment;
use crate::models::classification::Classification;
use crate::models::comment::Comment;
use crate::models::operation_record::{OperationKind, OperationRecord};
use crate::models::universal_state::{LockType, StateTransition, UniversalState};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::classification::list_classifications,
        super::classification::create_classification,
        super::classification::get_classification,
        super::classification::update_classification,
        super::classification::transition_classification,
        super::classification::delete_classification,
        super::attachment::list_attachments,
        super::attachment::create_attachment,
        super::attachment::get_attachment,
        super::attachment::update_attachment,
        super::attachment::delete_attachment,
        super::attachment::list_tags,
        super::attachment::add_tags,
        super::attachment::remove_tags,
        super::attachment::clear_tags,
        super::comment::list_comments,
        super::comment::create_comment,
        super::comment::get_comment,
        super::comment::update_comment,
        super::comment::delete_comment,
        super::operation_log::list_operation_logs,
    ),
    components(schemas(
        Classification,
        CreateClassificationPayload,
        UpdateClassificationPayload,
        StateTransitionPayload,
        StateTransition,
        LockType,
        UniversalState,
        Attachment,
        CreateAttachmentPayload,
        UpdateAttachmentPayload,
        TagsPayload,
        TagsResponse,
        Comment,
        CreateCommentPayload,
        UpdateCommentPayload,
        OperationRecord,
        OperationKind,
        OperationLogResponse,
    ))
)]
pub struct ApiDoc;

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
