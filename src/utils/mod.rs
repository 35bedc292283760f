pub mod crypto;
pub mod media;
pub mod telegram_auth;
pub mod telegram_text;
pub mod time;
