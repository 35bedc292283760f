use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub topic: Option<String>,
    pub body: Option<String>,
    pub category_id: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub is_anonymous: bool,
    pub author_id: Option<Uuid>,
    pub pending_edit: Option<JsonValue>,
    pub views_count: i64,
    pub telegram_message_id: Option<i64>,
}

/// Author columns joined onto an article row, prefixed `author_`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ArticleAuthor {
    #[sqlx(rename = "author_profile_id")]
    pub id: Option<Uuid>,
    #[sqlx(rename = "author_telegram_id")]
    pub telegram_id: Option<i64>,
    #[sqlx(rename = "author_username")]
    pub username: Option<String>,
    #[sqlx(rename = "author_first_name")]
    pub first_name: Option<String>,
    #[sqlx(rename = "author_last_name")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ArticleWithAuthor {
    #[sqlx(flatten)]
    pub article: Article,
    #[sqlx(flatten)]
    pub author: ArticleAuthor,
}

/// Edit awaiting moderation. Absent fields keep the published value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub is_anonymous: Option<bool>,
    #[serde(default)]
    pub sources: Option<JsonValue>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewOutcome {
    pub already_viewed: bool,
    pub views_count: i64,
}
