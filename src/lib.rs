pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    activity_service::ActivityService,
    article_service::ArticleService,
    moderation_service::ModerationService,
    notification_service::NotificationService,
    product_service::ProductService,
    profile_service::ProfileService,
    subscription_service::SubscriptionService,
    telegram_service::{BotApi, ChatId, TelegramService},
    welcome_service::WelcomeService,
};

pub const TELEGRAM_HTTP_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub user_bot: Arc<dyn BotApi>,
    pub profile_service: ProfileService,
    pub article_service: ArticleService,
    pub notification_service: NotificationService,
    pub activity_service: ActivityService,
    pub product_service: ProductService,
    pub subscription_service: SubscriptionService,
    pub moderation_service: ModerationService,
    pub welcome_service: WelcomeService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self> {
        let http_client = Client::builder().timeout(TELEGRAM_HTTP_TIMEOUT).build()?;

        let user_bot = TelegramService::new(
            http_client.clone(),
            &config.telegram_api_base,
            &config.telegram_bot_token,
            config.telegram_max_retries,
        );
        let admin_bot = TelegramService::new(
            http_client,
            &config.telegram_api_base,
            &config.admin_bot_token,
            config.telegram_max_retries,
        );

        Ok(Self::with_bots(config, pool, Arc::new(user_bot), Arc::new(admin_bot)))
    }

    /// Wires services around already constructed bot clients.
    pub fn with_bots(
        config: Config,
        pool: PgPool,
        user_bot: Arc<dyn BotApi>,
        admin_bot: Arc<dyn BotApi>,
    ) -> Self {
        let article_service = ArticleService::new(pool.clone());
        let moderation_service = ModerationService::new(
            article_service.clone(),
            admin_bot,
            ChatId::from(config.telegram_admin_chat_id.as_str()),
        );

        Self {
            profile_service: ProfileService::new(pool.clone()),
            notification_service: NotificationService::new(pool.clone()),
            activity_service: ActivityService::new(pool.clone()),
            product_service: ProductService::new(pool.clone()),
            subscription_service: SubscriptionService::new(pool.clone()),
            welcome_service: WelcomeService::new(pool.clone(), user_bot.clone()),
            article_service,
            moderation_service,
            user_bot,
            config: Arc::new(config),
            pool,
        }
    }
}

/// All edge functions, mounted under `/functions/v1`, plus `/health`.
pub fn build_router(state: AppState) -> Router {
    let functions = Router::new()
        .route("/tg-notifications", post(routes::notifications::tg_notifications))
        .route("/tg-my-activity", post(routes::activity::tg_my_activity))
        .route("/tg-add-view", post(routes::articles::tg_add_view))
        .route("/tg-update-article", post(routes::articles::tg_update_article))
        .route("/send-moderation", post(routes::moderation::send_moderation))
        .route("/send-edit-moderation", post(routes::moderation::send_edit_moderation))
        .route("/stars-create-invoice", post(routes::payments::stars_create_invoice))
        .route("/cryptobot-webhook", post(routes::webhook::cryptobot_webhook))
        .route("/tg-manage-product", post(routes::products::tg_manage_product))
        .route(
            "/send-welcome-notifications",
            post(routes::welcome::send_welcome_notifications),
        );

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/functions/v1", functions)
        .with_state(state)
        .layer(middleware::cors::mini_app_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
