use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use validator::Validate;

use crate::dto::product_dto::{
    ManageProductRequest, ProductAction, ProductInput, ProductListResponse, ProductResponse,
};
use crate::error::{Error, Result};
use crate::middleware::auth::authenticate;
use crate::models::profile::Profile;
use crate::services::product_service::MAX_PRODUCTS_PER_USER;
use crate::AppState;

fn require_premium(profile: &Profile) -> Result<()> {
    if profile.is_premium() {
        Ok(())
    } else {
        Err(Error::Forbidden("Premium subscription required".into()))
    }
}

fn require_input(product: Option<ProductInput>) -> Result<ProductInput> {
    product.ok_or_else(|| Error::BadRequest("product is required".into()))
}

async fn require_owned(state: &AppState, req: &ManageProductRequest, profile: &Profile) -> Result<uuid::Uuid> {
    let product_id = req
        .product_id
        .ok_or_else(|| Error::BadRequest("Invalid action".into()))?;
    match state.product_service.owner_of(product_id).await? {
        Some(owner) if owner == profile.id => Ok(product_id),
        _ => Err(Error::NotFound("Product not found".into())),
    }
}

pub async fn tg_manage_product(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ManageProductRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload?;
    req.validate()?;

    let user = authenticate(&state.config, req.init_data.as_deref())?;
    let profile = state.profile_service.require_by_telegram_id(user.id).await?;

    let Some(action) = req.parsed_action() else {
        return Err(Error::BadRequest("Invalid action".into()));
    };

    match action {
        ProductAction::List => {
            let products = state.product_service.list_by_owner(profile.id).await?;
            Ok(Json(ProductListResponse { products }).into_response())
        }
        ProductAction::Create => {
            require_premium(&profile)?;
            let input = require_input(req.product)?;

            if state.product_service.count_by_owner(profile.id).await? >= MAX_PRODUCTS_PER_USER {
                return Err(Error::Forbidden(
                    "Product limit reached. Maximum 1 product allowed.".into(),
                ));
            }

            let product = state.product_service.create(profile.id, &input).await?;
            state.moderation_service.send_product(&product, &profile).await;
            Ok(Json(ProductResponse { product }).into_response())
        }
        ProductAction::Update => {
            require_premium(&profile)?;
            let product_id = require_owned(&state, &req, &profile).await?;
            let input = require_input(req.product)?;

            let product = state.product_service.update(product_id, &input).await?;
            state.moderation_service.send_product(&product, &profile).await;
            Ok(Json(ProductResponse { product }).into_response())
        }
        ProductAction::Delete => {
            require_premium(&profile)?;
            let product_id = require_owned(&state, &req, &profile).await?;
            state.product_service.delete(product_id).await?;
            tracing::info!(%product_id, profile_id = %profile.id, "Product deleted");
            Ok(Json(json!({ "success": true })).into_response())
        }
    }
}
