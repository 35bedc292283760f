use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::notification::{NotificationFilter, NotificationPage};

/// In-app notifications shown in the Mini App inbox.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first, each row carrying `article` and `from_user` summaries.
    pub async fn list(
        &self,
        profile_id: Uuid,
        filter: NotificationFilter,
        limit: i64,
    ) -> Result<NotificationPage> {
        let types: Option<Vec<String>> = filter
            .types()
            .map(|t| t.iter().map(|s| s.to_string()).collect());

        let rows: Vec<(JsonValue,)> = sqlx::query_as(
            r#"
            SELECT to_jsonb(n) || jsonb_build_object(
                'article', CASE WHEN a.id IS NULL THEN NULL
                    ELSE jsonb_build_object('id', a.id, 'title', a.title, 'topic', a.topic) END,
                'from_user', CASE WHEN p.id IS NULL THEN NULL
                    ELSE jsonb_build_object(
                        'id', p.id, 'first_name', p.first_name, 'last_name', p.last_name,
                        'username', p.username, 'avatar_url', p.avatar_url) END
            )
            FROM notifications n
            LEFT JOIN articles a ON a.id = n.article_id
            LEFT JOIN profiles p ON p.id = n.from_user_id
            WHERE n.user_profile_id = $1
              AND ($2::text[] IS NULL OR n.type = ANY($2))
            ORDER BY n.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(profile_id)
        .bind(types)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let unread_count = self.unread_count(profile_id).await?;

        Ok(NotificationPage {
            notifications: rows.into_iter().map(|(n,)| n).collect(),
            unread_count,
        })
    }

    pub async fn unread_count(&self, profile_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_profile_id = $1 AND is_read = false",
        )
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn mark_all_read(&self, profile_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_profile_id = $1 AND is_read = false",
        )
        .bind(profile_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Inserts an unread notification on the caller's connection, so it can
    /// join a transaction that owns the triggering change.
    pub async fn create(
        conn: &mut PgConnection,
        profile_id: Uuid,
        kind: &str,
        message: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_profile_id, type, message, is_read)
            VALUES ($1, $2, $3, false)
            "#,
        )
        .bind(profile_id)
        .bind(kind)
        .bind(message)
        .execute(conn)
        .await?;
        Ok(())
    }
}
