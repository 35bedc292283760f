use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::models::scheduled_notification::{DueWelcome, WelcomeDispatch, WelcomeMedia, WelcomeSettings};
use crate::services::telegram_service::{BotApi, ChatId, SendMessageRequest, SentMessage};

pub const WELCOME_BATCH_SIZE: i64 = 50;

const SETTING_KEYS: [&str; 5] = [
    "welcome_message_text",
    "welcome_message_media_url",
    "welcome_message_media_type",
    "welcome_message_delay_minutes",
    "welcome_message_enabled",
];

/// Sends the configured welcome (photo, video or plain text) to one chat.
pub async fn send_welcome(
    api: &dyn BotApi,
    chat_id: ChatId,
    settings: &WelcomeSettings,
    text: &str,
) -> Result<SentMessage> {
    match settings.media() {
        Some((WelcomeMedia::Photo, url)) => {
            api.send_photo_url(chat_id, url.to_string(), Some(text.to_string()))
                .await
        }
        Some((WelcomeMedia::Video, url)) => {
            api.send_video_url(chat_id, url.to_string(), Some(text.to_string()))
                .await
        }
        None => {
            let mut request = SendMessageRequest::html(chat_id, text);
            request.disable_web_page_preview = false;
            api.send_message(request).await
        }
    }
}

/// The text to send, or the response for a dispatch that sends nothing.
fn welcome_text(settings: &WelcomeSettings) -> std::result::Result<&str, WelcomeDispatch> {
    if !settings.enabled {
        return Err(WelcomeDispatch {
            sent: 0,
            message: Some("Welcome message disabled".into()),
        });
    }
    settings.text.as_deref().ok_or_else(|| WelcomeDispatch {
        sent: 0,
        message: Some("No welcome message configured".into()),
    })
}

#[derive(Clone)]
pub struct WelcomeService {
    pool: PgPool,
    user_bot: Arc<dyn BotApi>,
}

impl WelcomeService {
    pub fn new(pool: PgPool, user_bot: Arc<dyn BotApi>) -> Self {
        Self { pool, user_bot }
    }

    pub async fn settings(&self) -> Result<WelcomeSettings> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT key, value::text FROM admin_settings WHERE key = ANY($1)",
        )
        .bind(&SETTING_KEYS[..])
        .fetch_all(&self.pool)
        .await?;

        Ok(WelcomeSettings::from_pairs(rows))
    }

    pub async fn due(&self, limit: i64) -> Result<Vec<DueWelcome>> {
        let rows = sqlx::query_as::<_, DueWelcome>(
            r#"
            SELECT s.id, p.telegram_id
            FROM scheduled_notifications s
            JOIN profiles p ON p.id = s.user_profile_id
            WHERE s.notification_type = 'welcome'
              AND s.sent_at IS NULL
              AND s.scheduled_at <= NOW()
            ORDER BY s.scheduled_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn mark_sent(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result =
            sqlx::query("UPDATE scheduled_notifications SET sent_at = NOW() WHERE id = ANY($1)")
                .bind(ids)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Sends every due welcome once. Rows are marked sent whatever the
    /// delivery outcome so a broken chat is not retried forever. While the
    /// welcome is disabled or has no text, due rows are left untouched.
    pub async fn dispatch(&self) -> Result<WelcomeDispatch> {
        let settings = self.settings().await?;

        let text = match welcome_text(&settings) {
            Ok(text) => text.to_string(),
            Err(skipped) => {
                info!(reason = ?skipped.message, "Welcome dispatch skipped");
                return Ok(skipped);
            }
        };

        let due = self.due(WELCOME_BATCH_SIZE).await?;
        if due.is_empty() {
            return Ok(WelcomeDispatch { sent: 0, message: None });
        }
        info!(count = due.len(), "Dispatching welcome messages");

        let mut sent = 0;
        let mut processed = Vec::with_capacity(due.len());
        for row in due {
            processed.push(row.id);
            let Some(telegram_id) = row.telegram_id else {
                warn!(notification_id = %row.id, "No telegram_id for scheduled welcome");
                continue;
            };
            match send_welcome(self.user_bot.as_ref(), ChatId::from(telegram_id), &settings, &text).await {
                Ok(_) => sent += 1,
                Err(e) => warn!(telegram_id, error = %e, "Failed to send welcome message"),
            }
        }

        self.mark_sent(&processed).await?;
        info!(sent, processed = processed.len(), "Welcome dispatch finished");

        Ok(WelcomeDispatch { sent, message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::telegram_service::MockBotApi;

    fn settings(media_url: Option<&str>, media_type: Option<&str>) -> WelcomeSettings {
        WelcomeSettings {
            enabled: true,
            text: Some("Привет!".into()),
            media_url: media_url.map(String::from),
            media_type: media_type.map(String::from),
        }
    }

    #[test]
    fn disabled_or_textless_welcome_sends_nothing() {
        let mut off = settings(None, None);
        off.enabled = false;
        let skipped = welcome_text(&off).unwrap_err();
        assert_eq!(skipped.sent, 0);
        assert_eq!(skipped.message.as_deref(), Some("Welcome message disabled"));

        let mut blank = settings(None, None);
        blank.text = None;
        let skipped = welcome_text(&blank).unwrap_err();
        assert_eq!(skipped.message.as_deref(), Some("No welcome message configured"));

        assert_eq!(welcome_text(&settings(None, None)).unwrap(), "Привет!");
    }

    #[tokio::test]
    async fn sends_video_with_caption() {
        let mut api = MockBotApi::new();
        api.expect_send_video_url()
            .times(1)
            .withf(|chat, url, caption| {
                chat.0 == "42" && url == "https://cdn/v.mp4" && caption.as_deref() == Some("Привет!")
            })
            .returning(|_, _, _| Ok(SentMessage { message_id: 1 }));

        let s = settings(Some("https://cdn/v.mp4"), Some("video"));
        send_welcome(&api, ChatId::from(42), &s, "Привет!").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_media_type_falls_back_to_text_with_preview() {
        let mut api = MockBotApi::new();
        api.expect_send_photo_url().never();
        api.expect_send_message()
            .times(1)
            .withf(|req| !req.disable_web_page_preview && req.text == "Привет!")
            .returning(|_| Ok(SentMessage { message_id: 1 }));

        let s = settings(Some("https://cdn/a.gif"), Some("gif"));
        send_welcome(&api, ChatId::from(42), &s, "Привет!").await.unwrap();
    }
}
