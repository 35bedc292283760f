use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tracing::info;

use crate::dto::payment_dto::{CreateInvoiceRequest, CreateInvoiceResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::authenticate;
use crate::services::payment_service::stars_invoice;
use crate::AppState;

pub async fn stars_create_invoice(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<Json<CreateInvoiceResponse>> {
    let Json(req) = payload?;

    let (Some(plan), Some(period)) = (
        req.plan.as_deref().filter(|p| !p.is_empty()),
        req.period.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(Error::BadRequest("Missing plan or period".into()));
    };

    if req.init_data.as_deref().map_or(true, str::is_empty) {
        return Err(Error::Unauthorized("User not authenticated".into()));
    }
    let user = authenticate(&state.config, req.init_data.as_deref())?;
    let profile = state.profile_service.require_by_telegram_id(user.id).await?;

    let (invoice, stars_amount) = stars_invoice(&profile.id.to_string(), plan, period, req.amount)?;
    info!(telegram_id = user.id, plan, period, amount = req.amount, stars_amount, "Creating Stars invoice");

    let invoice_url = state.user_bot.create_invoice_link(invoice).await?;

    Ok(Json(CreateInvoiceResponse {
        success: true,
        invoice_url,
        stars_amount,
    }))
}
