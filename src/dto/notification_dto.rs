use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsRequest {
    pub init_data: Option<String>,
    pub action: Option<String>,
    pub filter: Option<String>,
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}
