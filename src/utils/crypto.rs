use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Key-derivation label Telegram uses for both Mini App initData and
/// CryptoBot webhook signatures.
pub const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// First HMAC stage: `HMAC-SHA256(key = "WebAppData", message = token)`.
pub fn derive_secret(token: &str) -> [u8; 32] {
    hmac_sha256(WEB_APP_DATA_KEY, token.as_bytes())
}

/// Second HMAC stage, rendered as lowercase hex.
pub fn sign_hex(secret: &[u8; 32], message: &[u8]) -> String {
    hex::encode(hmac_sha256(secret, message))
}

pub fn constant_time_eq(a: &str, b: &str) -> bool {
    ConstantTimeEq::ct_eq(a.as_bytes(), b.as_bytes()).into()
}

/// Checks a CryptoBot `crypto-pay-api-signature` header against the raw
/// request body. The body must be the exact bytes received on the wire.
pub fn verify_webhook_signature(raw_body: &[u8], signature: &str, provider_token: &str) -> bool {
    let secret = derive_secret(provider_token);
    let expected = sign_hex(&secret, raw_body);
    constant_time_eq(&expected, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_body(body: &[u8], token: &str) -> String {
        sign_hex(&derive_secret(token), body)
    }

    #[test]
    fn hmac_matches_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn webhook_signature_accepts_exact_body() {
        let body = br#"{"update_id":1,"update_type":"invoice_paid"}"#;
        let sig = sign_body(body, "12345:AAbbCC");
        assert!(verify_webhook_signature(body, &sig, "12345:AAbbCC"));
    }

    #[test]
    fn webhook_signature_rejects_reserialized_body() {
        let raw = br#"{ "update_type": "invoice_paid",  "update_id": 1 }"#;
        let sig = sign_body(raw, "tok");

        let parsed: serde_json::Value = serde_json::from_slice(raw).unwrap();
        let reserialized = serde_json::to_vec(&parsed).unwrap();
        assert_eq!(parsed, serde_json::from_slice::<serde_json::Value>(&reserialized).unwrap());

        assert!(verify_webhook_signature(raw, &sig, "tok"));
        assert!(!verify_webhook_signature(&reserialized, &sig, "tok"));
    }

    #[test]
    fn webhook_signature_rejects_wrong_token_and_garbage() {
        let body = b"{}";
        let sig = sign_body(body, "right");
        assert!(!verify_webhook_signature(body, &sig, "wrong"));
        assert!(!verify_webhook_signature(body, "", "right"));
        assert!(!verify_webhook_signature(body, &sig[..10], "right"));
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(!constant_time_eq("abc", "abx"));
        assert!(constant_time_eq("", ""));
    }
}
