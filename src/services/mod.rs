pub mod activity_service;
pub mod article_service;
pub mod moderation_service;
pub mod notification_service;
pub mod payment_service;
pub mod product_service;
pub mod profile_service;
pub mod subscription_service;
pub mod telegram_service;
pub mod welcome_service;
