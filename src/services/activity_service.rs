use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::activity::{article_status_label, ActivityItem, ActivityType};

#[derive(Debug, FromRow)]
struct InteractionRow {
    id: Uuid,
    article_id: Uuid,
    title: String,
    topic: Option<String>,
    created_at: DateTime<Utc>,
    body: Option<String>,
}

#[derive(Debug, FromRow)]
struct AuthoredRow {
    id: Uuid,
    title: String,
    topic: Option<String>,
    status: Option<String>,
    created_at: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The user's likes, comments, authored and edited articles, newest first.
    pub async fn feed(&self, profile_id: Uuid, limit: i64) -> Result<Vec<ActivityItem>> {
        let likes = sqlx::query_as::<_, InteractionRow>(
            r#"
            SELECT l.id, l.article_id, a.title, a.topic, l.created_at, NULL::text AS body
            FROM article_likes l
            JOIN articles a ON a.id = l.article_id
            WHERE l.user_profile_id = $1
            ORDER BY l.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(profile_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let comments = sqlx::query_as::<_, InteractionRow>(
            r#"
            SELECT c.id, c.article_id, a.title, a.topic, c.created_at, c.body
            FROM article_comments c
            JOIN articles a ON a.id = c.article_id
            WHERE c.author_id = $1
            ORDER BY c.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(profile_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let authored = sqlx::query_as::<_, AuthoredRow>(
            r#"
            SELECT id, title, topic, status, created_at, edited_at
            FROM articles
            WHERE author_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(profile_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(merge_activity(likes, comments, authored, limit))
    }
}

fn merge_activity(
    likes: Vec<InteractionRow>,
    comments: Vec<InteractionRow>,
    authored: Vec<AuthoredRow>,
    limit: i64,
) -> Vec<ActivityItem> {
    let mut items = Vec::with_capacity(likes.len() + comments.len() + authored.len() * 2);

    items.extend(likes.into_iter().map(|l| ActivityItem {
        id: l.id.to_string(),
        kind: ActivityType::Like,
        article_id: l.article_id.to_string(),
        article_title: l.title,
        article_topic: l.topic,
        created_at: l.created_at,
        details: None,
    }));

    items.extend(comments.into_iter().map(|c| ActivityItem {
        id: c.id.to_string(),
        kind: ActivityType::Comment,
        article_id: c.article_id.to_string(),
        article_title: c.title,
        article_topic: c.topic,
        created_at: c.created_at,
        details: Some(c.body.unwrap_or_default().chars().take(100).collect()),
    }));

    for a in authored {
        items.push(ActivityItem {
            id: format!("created_{}", a.id),
            kind: ActivityType::ArticleCreated,
            article_id: a.id.to_string(),
            article_title: a.title.clone(),
            article_topic: a.topic.clone(),
            created_at: a.created_at,
            details: Some(article_status_label(a.status.as_deref()).to_string()),
        });

        if let Some(edited_at) = a.edited_at.filter(|e| *e != a.created_at) {
            items.push(ActivityItem {
                id: format!("edited_{}", a.id),
                kind: ActivityType::ArticleUpdated,
                article_id: a.id.to_string(),
                article_title: a.title,
                article_topic: a.topic,
                created_at: edited_at,
                details: None,
            });
        }
    }

    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(limit.max(0) as usize);
    items
}
