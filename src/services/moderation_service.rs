use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::article::{Article, ArticleAuthor, ArticleWithAuthor, PendingEdit};
use crate::models::product::Product;
use crate::models::profile::Profile;
use crate::services::article_service::ArticleService;
use crate::services::telegram_service::{
    send_chunked, BotApi, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, SentMessage,
};
use crate::utils::media::{is_data_url, parse_data_url};
use crate::utils::telegram_text::escape_html;

/// One admin-chat moderation message: an optional uploaded photo followed
/// by the (possibly chunked) text with approve/reject buttons.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationPrompt {
    pub photo: Option<PromptPhoto>,
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPhoto {
    pub data_url: String,
    pub caption: String,
}

fn decision_keyboard(approve_label: &str, approve: String, reject: String) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton::callback(approve_label, approve),
            InlineKeyboardButton::callback("❌ Отклонить", reject),
        ]],
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Да"
    } else {
        "Нет"
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("—")
}

fn author_lines(author: &ArticleAuthor) -> String {
    let full_name = format!(
        "{} {}",
        author.first_name.as_deref().unwrap_or(""),
        author.last_name.as_deref().unwrap_or("")
    );
    let full_name = full_name.trim();
    let name = if full_name.is_empty() { "Не указано" } else { full_name };

    let mut line = format!("👤 <b>Автор (оригинал):</b> {}", escape_html(name));
    if let Some(username) = author.username.as_deref().filter(|u| !u.is_empty()) {
        line.push_str(&format!(" (@{})", escape_html(username)));
    }

    let telegram_id = author
        .telegram_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "—".to_string());
    let profile_id = author
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "—".to_string());

    format!(
        "{}\n🆔 <b>Telegram ID:</b> {}\n🧾 <b>Profile ID:</b> <code>{}</code>",
        line, telegram_id, profile_id
    )
}

/// Trailing media line; data-URL photos are uploaded separately.
fn media_line(media_url: Option<&str>, media_type: Option<&str>) -> String {
    let Some(url) = media_url.filter(|u| !u.is_empty()) else {
        return String::new();
    };
    if is_data_url(url) {
        "\n\n🖼 <b>Медиа:</b> фото (см. выше)".to_string()
    } else if media_type == Some("youtube") {
        format!(
            "\n\n🎬 <b>Медиа:</b> <a href=\"https://youtube.com/watch?v={}\">YouTube ссылка</a>",
            escape_html(url)
        )
    } else {
        format!("\n\n🔗 <b>Медиа:</b> <a href=\"{}\">ссылка</a>", escape_html(url))
    }
}

fn data_url_photo(media_url: Option<&str>, caption: String) -> Option<PromptPhoto> {
    media_url.filter(|u| is_data_url(u)).map(|url| PromptPhoto {
        data_url: url.to_string(),
        caption,
    })
}

/// Prompt for a newly submitted article.
pub fn article_prompt(row: &ArticleWithAuthor, short_id: &str) -> ModerationPrompt {
    let article = &row.article;
    let short = escape_html(short_id);

    let text = format!(
        "🆕 <b>Статья на модерации</b>\n🆔 Код: <code>{short}</code>\n{author}\
         \n\n🗂 <b>Категория:</b> {category}\
         \n🧩 <b>Тема:</b> {topic}\
         \n📝 <b>Заголовок:</b> {title}\
         \n🙈 <b>Анонимная публикация:</b> {anonymous}\
         \n\n📄 <b>Текст:</b>\n{body}{media}",
        short = short,
        author = author_lines(&row.author),
        category = escape_html(or_dash(article.category_id.as_deref())),
        topic = escape_html(or_dash(article.topic.as_deref())),
        title = escape_html(&article.title),
        anonymous = yes_no(article.is_anonymous),
        body = escape_html(article.body.as_deref().unwrap_or("")),
        media = media_line(article.media_url.as_deref(), article.media_type.as_deref()),
    );

    ModerationPrompt {
        photo: data_url_photo(
            article.media_url.as_deref(),
            format!("🖼 <b>Медиа к статье</b>\n📝 {}", escape_html(&article.title)),
        ),
        text,
        keyboard: decision_keyboard(
            "✅ Принять",
            format!("approve:{}", short_id),
            format!("reject:{}", short_id),
        ),
    }
}

/// Article fields after applying a pending edit.
struct EditedView<'a> {
    title: &'a str,
    topic: Option<&'a str>,
    body: Option<&'a str>,
    media_url: Option<&'a str>,
    media_type: Option<&'a str>,
    is_anonymous: bool,
}

fn apply_edit<'a>(article: &'a Article, edit: &'a PendingEdit) -> EditedView<'a> {
    EditedView {
        title: edit.title.as_deref().unwrap_or(&article.title),
        topic: edit.topic.as_deref().or(article.topic.as_deref()),
        body: edit.body.as_deref().or(article.body.as_deref()),
        media_url: edit.media_url.as_deref().or(article.media_url.as_deref()),
        media_type: edit.media_type.as_deref().or(article.media_type.as_deref()),
        is_anonymous: edit.is_anonymous.unwrap_or(article.is_anonymous),
    }
}

fn change_summary(article: &Article, next: &EditedView<'_>) -> String {
    let mut changes = String::from("<b>📝 Изменения:</b>\n");
    if next.title != article.title {
        changes.push_str(&format!(
            "• <b>Заголовок:</b> <s>{}</s> ➡️ {}\n",
            escape_html(&article.title),
            escape_html(next.title)
        ));
    }
    if next.topic != article.topic.as_deref() {
        changes.push_str(&format!(
            "• <b>Тема:</b> <s>{}</s> ➡️ {}\n",
            escape_html(or_dash(article.topic.as_deref())),
            escape_html(or_dash(next.topic))
        ));
    }
    if next.is_anonymous != article.is_anonymous {
        changes.push_str(&format!(
            "• <b>Анонимность:</b> {} ➡️ {}\n",
            yes_no(article.is_anonymous),
            yes_no(next.is_anonymous)
        ));
    }
    if next.media_url != article.media_url.as_deref() {
        changes.push_str("• <b>Медиа:</b> изменено\n");
    }
    if next.body != article.body.as_deref() {
        changes.push_str("• <b>Текст:</b> изменён\n");
    }
    changes
}

/// Prompt for an edit awaiting approval on an already published article.
pub fn edit_prompt(row: &ArticleWithAuthor, edit: &PendingEdit, short_id: &str) -> ModerationPrompt {
    let article = &row.article;
    let next = apply_edit(article, edit);

    let text = format!(
        "✏️ <b>Редактирование статьи</b>\n🆔 Код: <code>{short}</code>\n{author}\
         \n\n{changes}\
         \n🗂 <b>Категория:</b> {category}\
         \n🧩 <b>Тема (новая):</b> {topic}\
         \n📝 <b>Заголовок (новый):</b> {title}\
         \n🙈 <b>Анонимная публикация (новая):</b> {anonymous}\
         \n\n📄 <b>Новая версия текста:</b>\n{body}{media}",
        short = escape_html(short_id),
        author = author_lines(&row.author),
        changes = change_summary(article, &next),
        category = escape_html(or_dash(article.category_id.as_deref())),
        topic = escape_html(or_dash(next.topic)),
        title = escape_html(next.title),
        anonymous = yes_no(next.is_anonymous),
        body = escape_html(next.body.unwrap_or("")),
        media = media_line(next.media_url, next.media_type),
    );

    ModerationPrompt {
        photo: data_url_photo(
            next.media_url,
            format!("🖼 <b>Медиа (после редактирования)</b>\n📝 {}", escape_html(next.title)),
        ),
        text,
        keyboard: decision_keyboard(
            "✅ Одобрить",
            format!("edit_approve:{}", short_id),
            format!("edit_reject:{}", short_id),
        ),
    }
}

/// Prompt for a created or updated marketplace product.
pub fn product_prompt(product: &Product, owner: &Profile) -> ModerationPrompt {
    let description = match product.description.as_deref().filter(|d| !d.is_empty()) {
        Some(d) if d.chars().count() > 300 => {
            format!("{}...", escape_html(&d.chars().take(300).collect::<String>()))
        }
        Some(d) => escape_html(d),
        None => "Нет описания".to_string(),
    };

    let mut text = format!(
        "📦 <b>Новый продукт на модерации</b>\n\n\
         🏷 <b>Код:</b> <code>{}</code>\n\
         📛 <b>Название:</b> {}\n\
         💰 <b>Цена:</b> {} {}\n\n\
         📝 <b>Описание:</b>\n{}\n",
        escape_html(product.short_code.as_deref().unwrap_or("N/A")),
        escape_html(&product.title),
        product.price,
        escape_html(&product.currency),
        description,
    );
    if let Some(media) = product.media_url.as_deref().filter(|m| !m.is_empty()) {
        text.push_str(&format!("\n🎬 <b>Медиа:</b> {}", escape_html(media)));
    }
    if let Some(link) = product.link.as_deref().filter(|l| !l.is_empty()) {
        text.push_str(&format!("\n🔗 <b>Ссылка:</b> {}", escape_html(link)));
    }
    text.push_str(&format!(
        "\n\n👤 <b>Автор:</b> {}",
        escape_html(&owner.display_handle())
    ));

    ModerationPrompt {
        photo: None,
        text,
        keyboard: decision_keyboard(
            "✅ Одобрить",
            format!("product_approve:{}", product.id),
            format!("product_reject:{}", product.id),
        ),
    }
}

/// Sends a prompt: photo upload first when present, then the chunked text
/// with the keyboard on the last chunk. Photo failures do not stop the text.
pub async fn deliver(api: &dyn BotApi, chat_id: &ChatId, prompt: ModerationPrompt) -> Option<SentMessage> {
    if let Some(photo) = prompt.photo {
        match parse_data_url(&photo.data_url) {
            Some(media) => {
                if let Err(e) = api.send_photo_upload(chat_id.clone(), media, photo.caption).await {
                    warn!(chat_id = %chat_id, error = %e, "Failed to upload moderation photo");
                }
            }
            None => warn!(chat_id = %chat_id, "Media is not a valid base64 data URL, skipping photo"),
        }
    }

    send_chunked(api, chat_id, &prompt.text, Some(prompt.keyboard)).await
}

/// Posts moderation prompts to the admin chat through the admin bot.
#[derive(Clone)]
pub struct ModerationService {
    articles: ArticleService,
    admin_bot: Arc<dyn BotApi>,
    admin_chat: ChatId,
}

impl ModerationService {
    pub fn new(articles: ArticleService, admin_bot: Arc<dyn BotApi>, admin_chat: ChatId) -> Self {
        Self {
            articles,
            admin_bot,
            admin_chat,
        }
    }

    /// Sends the new-article prompt and stores the resulting message id.
    pub async fn send_article(&self, article_id: Uuid) -> Result<Option<i64>> {
        let row = self
            .articles
            .get_with_author(article_id)
            .await?
            .ok_or_else(|| Error::NotFound("Article not found".into()))?;

        let short_id = self.articles.short_id(article_id).await;
        let prompt = article_prompt(&row, &short_id);
        let sent = deliver(self.admin_bot.as_ref(), &self.admin_chat, prompt).await;

        let message_id = sent.map(|m| m.message_id);
        if let Some(id) = message_id {
            self.articles.set_telegram_message_id(article_id, id).await?;
        }
        info!(%article_id, short_id = %short_id, ?message_id, "Article sent to moderation");
        Ok(message_id)
    }

    pub async fn send_edit(&self, article_id: Uuid) -> Result<Option<i64>> {
        let row = self
            .articles
            .get_with_author(article_id)
            .await?
            .ok_or_else(|| Error::NotFound("Article not found".into()))?;

        let edit: PendingEdit = match row.article.pending_edit.clone() {
            Some(value) if !value.is_null() => serde_json::from_value(value)?,
            _ => return Err(Error::BadRequest("No pending edit for this article".into())),
        };

        let short_id = self.articles.short_id(article_id).await;
        let prompt = edit_prompt(&row, &edit, &short_id);
        let sent = deliver(self.admin_bot.as_ref(), &self.admin_chat, prompt).await;

        let message_id = sent.map(|m| m.message_id);
        info!(%article_id, short_id = %short_id, ?message_id, "Article edit sent to moderation");
        Ok(message_id)
    }

    pub async fn send_product(&self, product: &Product, owner: &Profile) -> Option<i64> {
        let prompt = product_prompt(product, owner);
        let sent = deliver(self.admin_bot.as_ref(), &self.admin_chat, prompt).await;
        let message_id = sent.map(|m| m.message_id);
        info!(product_id = %product.id, ?message_id, "Product sent to moderation");
        message_id
    }
}
