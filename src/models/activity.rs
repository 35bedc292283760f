use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Like,
    Comment,
    ArticleCreated,
    ArticleUpdated,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub article_id: String,
    pub article_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_topic: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Human-readable moderation state for an authored article.
pub fn article_status_label(status: Option<&str>) -> &'static str {
    match status {
        Some("approved") => "Опубликовано",
        Some("pending") => "На модерации",
        _ => "Отклонено",
    }
}
