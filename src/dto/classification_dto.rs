use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::universal_state::{LockType, StateTransition};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateClassificationPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub lock_type: Option<LockType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateClassificationPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    pub lock_type: Option<LockType>,
    pub object_locked: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StateTransitionPayload {
    pub transition: StateTransition,
}
