use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub init_data: Option<String>,
    pub plan: Option<String>,
    pub period: Option<String>,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceResponse {
    pub success: bool,
    pub invoice_url: String,
    pub stars_amount: i64,
}

/// Payload embedded in a Stars invoice and echoed back on payment.
#[derive(Debug, Clone, Serialize)]
pub struct StarsInvoicePayload<'a> {
    pub profile_id: String,
    pub plan: &'a str,
    pub period: &'a str,
    pub amount_rub: f64,
    pub stars: i64,
}

/// A Crypto Pay webhook update. Only `invoice_paid` is acted on.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoBotUpdate {
    #[serde(default)]
    pub update_type: String,
    #[serde(default)]
    pub payload: Option<CryptoBotInvoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoBotInvoice {
    /// Decimal string, e.g. `"9.99"`.
    #[serde(default)]
    pub amount: Option<JsonValue>,
    /// Our JSON payload attached when the invoice was created.
    #[serde(default)]
    pub payload: Option<String>,
}

impl CryptoBotInvoice {
    pub fn amount(&self) -> f64 {
        match &self.amount {
            Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(0.0),
            Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionPurchase {
    pub telegram_id: i64,
    pub plan: String,
    pub period: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_invoice_amount_as_string_or_number() {
        let update: CryptoBotUpdate = serde_json::from_str(
            r#"{"update_type":"invoice_paid","payload":{"amount":"12.50","payload":"{}"}}"#,
        )
        .unwrap();
        assert_eq!(update.payload.unwrap().amount(), 12.5);

        let update: CryptoBotUpdate =
            serde_json::from_str(r#"{"update_type":"invoice_paid","payload":{"amount":3}}"#).unwrap();
        assert_eq!(update.payload.unwrap().amount(), 3.0);
    }
}
