use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Process-wide settings, built once in `main` and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    /// User-facing bot: signs initData, sends welcome messages, issues invoices.
    pub telegram_bot_token: String,
    /// Moderation bot posting into the admin chat.
    pub admin_bot_token: String,
    pub telegram_admin_chat_id: String,
    pub telegram_api_base: String,
    pub telegram_max_retries: u32,
    pub cryptobot_api_token: Option<String>,
    pub internal_api_secret: Option<String>,
    pub init_data_max_age_secs: Option<i64>,
    pub welcome_dispatch_interval_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            telegram_bot_token: get_env("TELEGRAM_BOT_TOKEN")?,
            admin_bot_token: get_env("ADMIN_BOT_TOKEN")?,
            telegram_admin_chat_id: get_env("TELEGRAM_ADMIN_CHAT_ID")?,
            telegram_api_base: get_env_opt("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
            telegram_max_retries: get_env_parse_opt("TELEGRAM_MAX_RETRIES")?.unwrap_or(3),
            cryptobot_api_token: get_env_opt("CRYPTOBOT_API_TOKEN"),
            internal_api_secret: get_env_opt("INTERNAL_API_SECRET"),
            init_data_max_age_secs: get_env_parse_opt("INIT_DATA_MAX_AGE_SECS")?,
            welcome_dispatch_interval_secs: get_env_parse_opt("WELCOME_DISPATCH_INTERVAL_SECS")?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = get_env_opt(name) else {
        return Ok(None);
    };
    raw.parse()
        .map(Some)
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}
