pub mod activity;
pub mod article;
pub mod notification;
pub mod product;
pub mod profile;
pub mod scheduled_notification;
