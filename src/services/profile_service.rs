use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::profile::Profile;

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, telegram_id, username, first_name, last_name, subscription_tier, referred_by
            FROM profiles
            WHERE telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Profile of an authenticated Telegram user; 404 when they never
    /// opened the Mini App.
    pub async fn require_by_telegram_id(&self, telegram_id: i64) -> Result<Profile> {
        self.get_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| Error::NotFound("Profile not found".into()))
    }
}
