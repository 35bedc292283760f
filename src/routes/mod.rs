pub mod activity;
pub mod articles;
pub mod health;
pub mod moderation;
pub mod notifications;
pub mod payments;
pub mod products;
pub mod webhook;
pub mod welcome;
