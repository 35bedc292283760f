use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::utils::telegram_auth::{check_auth_date, verify_init_data, TelegramUser};
use crate::utils::time::unix_now;

pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Resolves the Telegram user behind a Mini App request.
///
/// Missing initData is a 400; anything that fails verification (or is
/// older than `INIT_DATA_MAX_AGE_SECS`, when set) is a 401.
pub fn authenticate(config: &Config, init_data: Option<&str>) -> Result<TelegramUser> {
    let Some(init_data) = init_data.filter(|d| !d.is_empty()) else {
        return Err(Error::BadRequest("initData is required".into()));
    };

    let verdict = verify_init_data(init_data, &config.telegram_bot_token);
    let user = match (verdict.valid, verdict.user) {
        (true, Some(user)) => user,
        _ => {
            let reason = verdict
                .reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".into());
            tracing::warn!(%reason, "Rejected Telegram initData");
            return Err(Error::Unauthorized("Invalid Telegram initData".into()));
        }
    };

    if let Some(max_age) = config.init_data_max_age_secs {
        if !check_auth_date(verdict.auth_date, unix_now(), max_age) {
            tracing::warn!(telegram_id = user.id, "Rejected stale Telegram initData");
            return Err(Error::Unauthorized("Invalid Telegram initData".into()));
        }
    }

    Ok(user)
}

/// Guards service-to-service endpoints. Open when no secret is configured.
pub fn require_internal_secret(config: &Config, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = config.internal_api_secret.as_deref() else {
        return Ok(());
    };
    let Some(secret_hdr) = headers.get(INTERNAL_SECRET_HEADER) else {
        return Err(Error::Unauthorized("missing_internal_secret".into()));
    };
    let provided = secret_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_internal_secret".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::telegram_auth::sign_init_data;
    use axum::http::HeaderValue;

    const TOKEN: &str = "123456:TEST";

    fn config() -> Config {
        Config {
            server_address: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/test".into(),
            telegram_bot_token: TOKEN.into(),
            admin_bot_token: "admin".into(),
            telegram_admin_chat_id: "-1".into(),
            telegram_api_base: "http://localhost".into(),
            telegram_max_retries: 1,
            cryptobot_api_token: None,
            internal_api_secret: None,
            init_data_max_age_secs: None,
            welcome_dispatch_interval_secs: None,
        }
    }

    fn signed(auth_date: i64) -> String {
        let ts = auth_date.to_string();
        sign_init_data(
            &[("auth_date", &ts), ("user", r#"{"id":42,"first_name":"A"}"#)],
            TOKEN,
        )
    }

    #[test]
    fn missing_init_data_is_bad_request() {
        assert!(matches!(authenticate(&config(), None), Err(Error::BadRequest(_))));
        assert!(matches!(authenticate(&config(), Some("")), Err(Error::BadRequest(_))));
    }

    #[test]
    fn forged_init_data_is_unauthorized() {
        let forged = signed(unix_now()).replace("42", "43");
        assert!(matches!(
            authenticate(&config(), Some(&forged)),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn valid_init_data_yields_user() {
        let user = authenticate(&config(), Some(&signed(unix_now()))).unwrap();
        assert_eq!(user.id, 42);
    }

    #[test]
    fn stale_init_data_rejected_only_when_max_age_set() {
        let old = signed(unix_now() - 7200);
        assert!(authenticate(&config(), Some(&old)).is_ok());

        let mut strict = config();
        strict.init_data_max_age_secs = Some(3600);
        assert!(matches!(authenticate(&strict, Some(&old)), Err(Error::Unauthorized(_))));
        assert!(authenticate(&strict, Some(&signed(unix_now()))).is_ok());
    }

    #[test]
    fn internal_secret_checked_only_when_configured() {
        let mut headers = HeaderMap::new();
        assert!(require_internal_secret(&config(), &headers).is_ok());

        let mut guarded = config();
        guarded.internal_api_secret = Some("s3cret".into());
        assert!(require_internal_secret(&guarded, &headers).is_err());

        headers.insert(INTERNAL_SECRET_HEADER, HeaderValue::from_static("wrong"));
        assert!(require_internal_secret(&guarded, &headers).is_err());

        headers.insert(INTERNAL_SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(require_internal_secret(&guarded, &headers).is_ok());
    }
}
