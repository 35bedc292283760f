use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductAction {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub currency: Option<String>,
    pub media_url: Option<String>,
    #[validate(url)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManageProductRequest {
    pub init_data: Option<String>,
    /// Kept raw so an unknown action is a 400 from the handler, not a parse error.
    pub action: Option<String>,
    pub product_id: Option<Uuid>,
    #[validate(nested)]
    pub product: Option<ProductInput>,
}

impl ManageProductRequest {
    pub fn parsed_action(&self) -> Option<ProductAction> {
        let raw = self.action.as_deref()?;
        serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}
