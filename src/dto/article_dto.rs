use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddViewRequest {
    pub init_data: Option<String>,
    pub article_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddViewResponse {
    pub success: bool,
    pub already_viewed: bool,
    #[serde(rename = "views_count")]
    pub views_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ArticleUpdates {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    pub topic: Option<String>,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub is_anonymous: Option<bool>,
    pub sources: Option<JsonValue>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub init_data: Option<String>,
    pub article_id: Option<Uuid>,
    #[validate(nested)]
    pub updates: Option<ArticleUpdates>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateArticleResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    pub article_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResponse {
    pub success: bool,
    pub message_id: Option<i64>,
}

/// `send-edit-moderation` has always answered in snake_case.
#[derive(Debug, Clone, Serialize)]
pub struct EditModerationResponse {
    pub success: bool,
    pub message_id: Option<i64>,
}
