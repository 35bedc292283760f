use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::activity::ActivityItem;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub init_data: Option<String>,
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    pub activities: Vec<ActivityItem>,
}
