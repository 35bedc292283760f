use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::article::{ArticleWithAuthor, PendingEdit, ViewOutcome};

#[derive(Clone)]
pub struct ArticleService {
    pool: PgPool,
}

impl ArticleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_with_author(&self, id: Uuid) -> Result<Option<ArticleWithAuthor>> {
        let row = sqlx::query_as::<_, ArticleWithAuthor>(
            r#"
            SELECT
                a.id, a.title, a.topic, a.body, a.category_id::text AS category_id,
                a.media_url, a.media_type, COALESCE(a.is_anonymous, false) AS is_anonymous,
                a.author_id, a.pending_edit,
                COALESCE(a.views_count, 0)::bigint AS views_count,
                a.telegram_message_id::bigint AS telegram_message_id,
                p.id AS author_profile_id, p.telegram_id AS author_telegram_id,
                p.username AS author_username, p.first_name AS author_first_name,
                p.last_name AS author_last_name
            FROM articles a
            LEFT JOIN profiles p ON p.id = a.author_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Short moderation code for an article, created on first use by the
    /// `get_or_create_short_id` database function. Falls back to the first
    /// eight characters of the id when the function fails.
    pub async fn short_id(&self, id: Uuid) -> String {
        let res: std::result::Result<(String,), sqlx::Error> =
            sqlx::query_as("SELECT get_or_create_short_id($1)::text")
                .bind(id)
                .fetch_one(&self.pool)
                .await;

        match res {
            Ok((short,)) => short,
            Err(e) => {
                tracing::warn!(article_id = %id, error = %e, "Could not get short id, using id prefix");
                id.to_string()[..8].to_string()
            }
        }
    }

    pub async fn submit_pending_edit(&self, id: Uuid, edit: &PendingEdit) -> Result<()> {
        let edit_json: JsonValue = serde_json::to_value(edit)?;
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET pending_edit = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(edit_json)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Article not found".into()));
        }
        Ok(())
    }

    pub async fn set_telegram_message_id(&self, id: Uuid, message_id: i64) -> Result<()> {
        sqlx::query("UPDATE articles SET telegram_message_id = $1 WHERE id = $2")
            .bind(message_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records one view per profile and bumps the article counter.
    ///
    /// The article row is locked for the duration of the transaction, so
    /// concurrent views of the same article serialize on it and the
    /// check-then-insert cannot double count.
    pub async fn record_view(&self, article_id: Uuid, profile_id: Uuid) -> Result<ViewOutcome> {
        let mut tx = self.pool.begin().await?;

        let (current,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(views_count, 0)::bigint FROM articles WHERE id = $1 FOR UPDATE",
        )
        .bind(article_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Article not found".into()))?;

        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM article_views WHERE article_id = $1 AND user_profile_id = $2 LIMIT 1",
        )
        .bind(article_id)
        .bind(profile_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            tx.commit().await?;
            return Ok(ViewOutcome {
                already_viewed: true,
                views_count: current,
            });
        }

        sqlx::query("INSERT INTO article_views (article_id, user_profile_id) VALUES ($1, $2)")
            .bind(article_id)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        let (views_count,): (i64,) = sqlx::query_as(
            r#"
            UPDATE articles
            SET views_count = COALESCE(views_count, 0) + 1
            WHERE id = $1
            RETURNING views_count::bigint
            "#,
        )
        .bind(article_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ViewOutcome {
            already_viewed: false,
            views_count,
        })
    }
}
