use crate::dto::payment_dto::{CryptoBotUpdate, StarsInvoicePayload, SubscriptionPurchase};
use crate::error::{Error, Result};
use crate::services::telegram_service::{CreateInvoiceLinkRequest, LabeledPrice};

pub const RUB_PER_STAR: f64 = 1.8;
pub const MIN_STARS: i64 = 1;
pub const MAX_STARS: i64 = 2500;

/// Fixed-rate RUB to Telegram Stars conversion, clamped to the range
/// Telegram accepts for a single payment.
pub fn convert_rub_to_stars(rub: f64) -> i64 {
    if !rub.is_finite() {
        return MIN_STARS;
    }
    let stars = (rub / RUB_PER_STAR).ceil();
    (stars.clamp(MIN_STARS as f64, MAX_STARS as f64)) as i64
}

pub fn plan_title(plan: &str) -> &'static str {
    if plan == "plus" {
        "ManHub Plus"
    } else {
        "ManHub Premium"
    }
}

/// Builds the `createInvoiceLink` request for a Stars (XTR) subscription.
pub fn stars_invoice(
    profile_id: &str,
    plan: &str,
    period: &str,
    amount_rub: f64,
) -> Result<(CreateInvoiceLinkRequest, i64)> {
    let stars = convert_rub_to_stars(amount_rub);
    let title = plan_title(plan);
    let description = if period == "monthly" {
        format!("Подписка {} на 1 месяц", title)
    } else {
        format!("Подписка {} на 1 год", title)
    };

    let payload = serde_json::to_string(&StarsInvoicePayload {
        profile_id: profile_id.to_string(),
        plan,
        period,
        amount_rub,
        stars,
    })?;

    let request = CreateInvoiceLinkRequest {
        title: title.to_string(),
        description,
        payload,
        currency: "XTR".to_string(),
        prices: vec![LabeledPrice {
            label: title.to_string(),
            amount: stars,
        }],
    };
    Ok((request, stars))
}

/// Extracts the purchase from a verified CryptoBot update.
///
/// `Ok(None)` for update types other than `invoice_paid`.
pub fn paid_purchase(update: &CryptoBotUpdate) -> Result<Option<(SubscriptionPurchase, f64)>> {
    if update.update_type != "invoice_paid" {
        return Ok(None);
    }

    let invoice = update
        .payload
        .as_ref()
        .ok_or_else(|| Error::BadRequest("Invalid payload".into()))?;
    let raw = invoice
        .payload
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::BadRequest("Invalid payload".into()))?;

    let purchase: SubscriptionPurchase = serde_json::from_str(raw)
        .map_err(|_| Error::BadRequest("Invalid invoice payload".into()))?;

    Ok(Some((purchase, invoice.amount())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_and_clamps_stars() {
        assert_eq!(convert_rub_to_stars(299.0), 167);
        assert_eq!(convert_rub_to_stars(1.8), 1);
        assert_eq!(convert_rub_to_stars(0.0), 1);
        assert_eq!(convert_rub_to_stars(-50.0), 1);
        assert_eq!(convert_rub_to_stars(1_000_000.0), 2500);
        assert_eq!(convert_rub_to_stars(f64::NAN), 1);
    }

    #[test]
    fn builds_xtr_invoice() {
        let (req, stars) = stars_invoice("p-1", "plus", "monthly", 199.0).unwrap();
        assert_eq!(stars, 111);
        assert_eq!(req.currency, "XTR");
        assert_eq!(req.title, "ManHub Plus");
        assert_eq!(req.description, "Подписка ManHub Plus на 1 месяц");
        assert_eq!(req.prices[0].amount, 111);

        let payload: serde_json::Value = serde_json::from_str(&req.payload).unwrap();
        assert_eq!(payload["profile_id"], "p-1");
        assert_eq!(payload["stars"], 111);

        let (yearly, _) = stars_invoice("p-1", "premium", "yearly", 1990.0).unwrap();
        assert_eq!(yearly.description, "Подписка ManHub Premium на 1 год");
    }

    fn update(json: &str) -> CryptoBotUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn ignores_other_update_types() {
        let u = update(r#"{"update_type":"invoice_created"}"#);
        assert!(paid_purchase(&u).unwrap().is_none());

        let untyped = update(r#"{"payload":{"amount":"1"}}"#);
        assert!(paid_purchase(&untyped).unwrap().is_none());
    }

    #[test]
    fn extracts_paid_purchase() {
        let u = update(
            r#"{"update_type":"invoice_paid","payload":{"amount":"10.00",
                "payload":"{\"telegram_id\":42,\"plan\":\"premium\",\"period\":\"yearly\"}"}}"#,
        );
        let (purchase, amount) = paid_purchase(&u).unwrap().unwrap();
        assert_eq!(purchase.telegram_id, 42);
        assert_eq!(purchase.period, "yearly");
        assert_eq!(amount, 10.0);
    }

    #[test]
    fn missing_or_garbled_payload_is_bad_request() {
        let missing = update(r#"{"update_type":"invoice_paid","payload":{"amount":"1"}}"#);
        assert!(matches!(paid_purchase(&missing), Err(Error::BadRequest(_))));

        let garbled = update(r#"{"update_type":"invoice_paid","payload":{"payload":"not json"}}"#);
        assert!(matches!(paid_purchase(&garbled), Err(Error::BadRequest(_))));
    }
}
