use async_trait::async_trait;
use rand::Rng;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::utils::media::DataUrlMedia;
use crate::utils::telegram_text::{split_for_telegram, truncate_chars, MAX_CAPTION_CHARS, MAX_MESSAGE_CHARS};

const MAX_BACKOFF: Duration = Duration::from_secs(10);
const MAX_RETRY_AFTER_SECS: u64 = 30;

/// Chat identifier as Telegram accepts it: numeric id or `@channel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId(id.to_string())
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        ChatId(id.to_string())
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: ChatId,
    pub text: String,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessageRequest {
    pub fn html(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledPrice {
    pub label: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateInvoiceLinkRequest {
    pub title: String,
    pub description: String,
    pub payload: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Clone, Serialize)]
struct MediaByUrlRequest<'a> {
    chat_id: &'a ChatId,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    parse_mode: &'static str,
}

/// The Bot API surface the handlers depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_message(&self, request: SendMessageRequest) -> Result<SentMessage>;

    /// Uploads decoded data-URL bytes as a multipart `sendPhoto`.
    async fn send_photo_upload(
        &self,
        chat_id: ChatId,
        media: DataUrlMedia,
        caption: String,
    ) -> Result<SentMessage>;

    async fn send_photo_url(
        &self,
        chat_id: ChatId,
        photo_url: String,
        caption: Option<String>,
    ) -> Result<SentMessage>;

    async fn send_video_url(
        &self,
        chat_id: ChatId,
        video_url: String,
        caption: Option<String>,
    ) -> Result<SentMessage>;

    async fn create_invoice_link(&self, request: CreateInvoiceLinkRequest) -> Result<String>;
}

#[derive(Clone)]
pub struct TelegramService {
    client: Client,
    api_base: String,
    token: String,
    max_retries: u32,
    retry_base: Duration,
}

enum Attempt<T> {
    Done(Result<T>),
    Retry(Error, Option<u64>),
}

impl TelegramService {
    pub fn new(client: Client, api_base: &str, token: &str, max_retries: u32) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            max_retries: max_retries.max(1),
            retry_base: Duration::from_millis(500),
        }
    }

    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn backoff(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        if let Some(secs) = retry_after {
            return Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS));
        }
        let exp = self
            .retry_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=100));
        exp.min(MAX_BACKOFF) + jitter
    }

    /// Runs a Bot API call, retrying transport errors, 429 and 5xx replies
    /// up to `max_retries` attempts. `build` is invoked once per attempt.
    async fn call<T, F>(&self, method: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client, &str) -> Result<RequestBuilder>,
    {
        let url = self.method_url(method);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match build(&self.client, &url)?.send().await {
                Ok(resp) => Self::read_reply::<T>(method, resp).await,
                Err(err) => Attempt::Retry(Error::Reqwest(err), None),
            };

            match outcome {
                Attempt::Done(result) => return result,
                Attempt::Retry(err, retry_after) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    let delay = self.backoff(attempt, retry_after);
                    warn!(
                        method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Telegram call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn read_reply<T: DeserializeOwned>(method: &str, resp: reqwest::Response) -> Attempt<T> {
        let status = resp.status();
        let transient = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

        let body = match resp.json::<TelegramResponse<T>>().await {
            Ok(body) => body,
            Err(err) if transient => return Attempt::Retry(Error::Reqwest(err), None),
            Err(err) => {
                return Attempt::Done(Err(Error::Telegram(format!(
                    "{} returned unreadable reply ({}): {}",
                    method, status, err
                ))))
            }
        };

        if body.ok {
            return Attempt::Done(body.result.ok_or_else(|| {
                Error::Telegram(format!("{} returned ok without result", method))
            }));
        }

        let err = Error::Telegram(format!(
            "{} failed ({}): {}",
            method,
            status,
            body.description.unwrap_or_default()
        ));
        if transient {
            Attempt::Retry(err, body.parameters.and_then(|p| p.retry_after))
        } else {
            Attempt::Done(Err(err))
        }
    }

    async fn send_media_by_url(
        &self,
        method: &str,
        request: MediaByUrlRequest<'_>,
    ) -> Result<SentMessage> {
        self.call(method, |client, url| Ok(client.post(url).json(&request)))
            .await
    }
}

#[async_trait]
impl BotApi for TelegramService {
    async fn send_message(&self, request: SendMessageRequest) -> Result<SentMessage> {
        self.call("sendMessage", |client, url| Ok(client.post(url).json(&request)))
            .await
    }

    async fn send_photo_upload(
        &self,
        chat_id: ChatId,
        media: DataUrlMedia,
        caption: String,
    ) -> Result<SentMessage> {
        let caption = truncate_chars(&caption, MAX_CAPTION_CHARS);
        self.call("sendPhoto", |client, url| {
            let part = Part::bytes(media.bytes.clone())
                .file_name(media.filename.clone())
                .mime_str(&media.mime)?;
            let form = Form::new()
                .text("chat_id", chat_id.0.clone())
                .part("photo", part)
                .text("caption", caption.clone())
                .text("parse_mode", "HTML");
            Ok(client.post(url).multipart(form))
        })
        .await
    }

    async fn send_photo_url(
        &self,
        chat_id: ChatId,
        photo_url: String,
        caption: Option<String>,
    ) -> Result<SentMessage> {
        let request = MediaByUrlRequest {
            chat_id: &chat_id,
            photo: Some(&photo_url),
            video: None,
            caption: caption.map(|c| truncate_chars(&c, MAX_CAPTION_CHARS)),
            parse_mode: "HTML",
        };
        self.send_media_by_url("sendPhoto", request).await
    }

    async fn send_video_url(
        &self,
        chat_id: ChatId,
        video_url: String,
        caption: Option<String>,
    ) -> Result<SentMessage> {
        let request = MediaByUrlRequest {
            chat_id: &chat_id,
            photo: None,
            video: Some(&video_url),
            caption: caption.map(|c| truncate_chars(&c, MAX_CAPTION_CHARS)),
            parse_mode: "HTML",
        };
        self.send_media_by_url("sendVideo", request).await
    }

    async fn create_invoice_link(&self, request: CreateInvoiceLinkRequest) -> Result<String> {
        self.call("createInvoiceLink", |client, url| {
            Ok(client.post(url).json(&request))
        })
        .await
    }
}

/// Sends `text` as sequential chunks; only the final chunk carries
/// `reply_markup`. A failed chunk is logged and the rest still go out.
/// Returns the final chunk's message, or `None` if that send failed.
pub async fn send_chunked(
    api: &dyn BotApi,
    chat_id: &ChatId,
    text: &str,
    reply_markup: Option<InlineKeyboardMarkup>,
) -> Option<SentMessage> {
    let parts = split_for_telegram(text, MAX_MESSAGE_CHARS);
    let total = parts.len();
    let mut last = None;

    for (i, part) in parts.into_iter().enumerate() {
        let mut request = SendMessageRequest::html(chat_id.clone(), part);
        if i + 1 == total {
            request.reply_markup = reply_markup.clone();
        }
        match api.send_message(request).await {
            Ok(sent) if i + 1 == total => last = Some(sent),
            Ok(_) => {}
            Err(e) => warn!(chat_id = %chat_id, part = i + 1, total, error = %e, "Failed to send message part"),
        }
    }

    if let Some(sent) = &last {
        info!(chat_id = %chat_id, parts = total, message_id = sent.message_id, "Delivered Telegram message");
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn keyboard() -> InlineKeyboardMarkup {
        InlineKeyboardMarkup {
            inline_keyboard: vec![vec![
                InlineKeyboardButton::callback("✅", "approve:abc"),
                InlineKeyboardButton::callback("❌", "reject:abc"),
            ]],
        }
    }

    #[tokio::test]
    async fn keyboard_only_on_last_chunk() {
        let sent: Arc<Mutex<Vec<SendMessageRequest>>> = Arc::default();
        let log = sent.clone();

        let mut api = MockBotApi::new();
        api.expect_send_message().times(3).returning(move |req| {
            let mut log = log.lock().unwrap();
            log.push(req);
            Ok(SentMessage { message_id: log.len() as i64 })
        });

        let text = format!("{}\n{}\n{}", "a".repeat(3500), "b".repeat(3500), "c".repeat(400));
        let last = send_chunked(&api, &ChatId::from(-100500), &text, Some(keyboard())).await;

        assert_eq!(last, Some(SentMessage { message_id: 3 }));
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].reply_markup.is_none());
        assert!(sent[1].reply_markup.is_none());
        assert_eq!(sent[2].reply_markup, Some(keyboard()));
        assert_eq!(sent.iter().map(|r| r.text.as_str()).collect::<String>(), text);
    }

    #[tokio::test]
    async fn single_chunk_carries_keyboard() {
        let mut api = MockBotApi::new();
        api.expect_send_message()
            .times(1)
            .withf(|req| req.reply_markup.is_some() && req.text == "short" && req.parse_mode == "HTML")
            .returning(|_| Ok(SentMessage { message_id: 10 }));

        let last = send_chunked(&api, &ChatId::from("@admins"), "short", Some(keyboard())).await;
        assert_eq!(last.map(|m| m.message_id), Some(10));
    }

    #[tokio::test]
    async fn failed_chunk_does_not_stop_delivery() {
        let mut api = MockBotApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::Telegram("boom".into())));
        api.expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.reply_markup.is_some())
            .returning(|_| Ok(SentMessage { message_id: 2 }));

        let text = format!("{}\n{}", "a".repeat(3500), "b".repeat(3500));
        let last = send_chunked(&api, &ChatId::from(1), &text, Some(keyboard())).await;
        assert_eq!(last.map(|m| m.message_id), Some(2));
    }

    #[tokio::test]
    async fn failed_final_chunk_yields_none() {
        let mut api = MockBotApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.reply_markup.is_none())
            .returning(|_| Ok(SentMessage { message_id: 1 }));
        api.expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.reply_markup.is_some())
            .returning(|_| Err(Error::Telegram("Bad Request: message is too long".into())));

        let text = format!("{}\n{}", "a".repeat(3500), "b".repeat(3500));
        let last = send_chunked(&api, &ChatId::from(1), &text, Some(keyboard())).await;
        assert_eq!(last, None);
    }

    #[test]
    fn send_message_serializes_like_bot_api() {
        let mut req = SendMessageRequest::html(ChatId::from(42), "hi");
        req.reply_markup = Some(keyboard());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["disable_web_page_preview"], true);
        assert_eq!(json["reply_markup"]["inline_keyboard"][0][1]["callback_data"], "reject:abc");

        let plain = serde_json::to_value(SendMessageRequest::html(ChatId::from(1), "x")).unwrap();
        assert!(plain.get("reply_markup").is_none());
    }

    #[test]
    fn backoff_grows_and_honors_retry_after() {
        let svc = TelegramService::new(Client::new(), "http://localhost/", "t", 3);
        assert_eq!(svc.method_url("getMe"), "http://localhost/bott/getMe");
        let first = svc.backoff(1, None);
        let third = svc.backoff(3, None);
        assert!(first >= Duration::from_millis(500) && first <= Duration::from_millis(600));
        assert!(third >= Duration::from_millis(2000) && third <= Duration::from_millis(2100));
        assert_eq!(svc.backoff(1, Some(7)), Duration::from_secs(7));
        assert_eq!(svc.backoff(1, Some(600)), Duration::from_secs(30));
        assert!(svc.backoff(20, None) <= MAX_BACKOFF + Duration::from_millis(100));
    }
}
