use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::operation_record::OperationRecord;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OperationLogQuery {
    /// Restrict to one entity; requires `entity_id` as well.
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub limit: Option<i64>,
}

impl OperationLogQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationLogResponse {
    pub items: Vec<OperationRecord>,
    pub total: usize,
}

impl From<Vec<OperationRecord>> for OperationLogResponse {
    fn from(items: Vec<OperationRecord>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(OperationLogQuery::default().limit(), DEFAULT_LIMIT);
        let q = OperationLogQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(q.limit(), MAX_LIMIT);
        let q = OperationLogQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(q.limit(), 1);
    }
}
