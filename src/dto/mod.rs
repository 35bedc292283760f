pub mod activity_dto;
pub mod article_dto;
pub mod notification_dto;
pub mod payment_dto;
pub mod product_dto;
