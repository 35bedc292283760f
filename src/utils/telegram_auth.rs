use serde::{Deserialize, Serialize};

use crate::utils::crypto::{constant_time_eq, derive_secret, sign_hex};

/// Identity asserted by a verified initData `user` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: Option<bool>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingHash,
    HashMismatch,
    MissingUser,
    MalformedUser,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Rejection::MissingHash => "no hash",
            Rejection::HashMismatch => "hash mismatch",
            Rejection::MissingUser => "no user",
            Rejection::MalformedUser => "malformed user",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitDataVerification {
    pub valid: bool,
    pub user: Option<TelegramUser>,
    pub auth_date: Option<i64>,
    pub reason: Option<Rejection>,
}

impl InitDataVerification {
    fn reject(reason: Rejection) -> Self {
        Self {
            valid: false,
            user: None,
            auth_date: None,
            reason: Some(reason),
        }
    }
}

/// Decodes initData with `application/x-www-form-urlencoded` rules, keeping
/// the original pair order and any duplicate keys.
pub fn parse_init_data(init_data: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Sorts the pairs by key (stable, byte order) and joins them as
/// `key=value` lines.
pub fn data_check_string<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut sorted: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn compute_hash(data_check_string: &str, bot_token: &str) -> String {
    let secret = derive_secret(bot_token);
    sign_hex(&secret, data_check_string.as_bytes())
}

/// Verifies a Telegram Mini App initData string against the bot token.
///
/// Never fails with an error: every malformed or forged input resolves to
/// `valid == false` with the rejection reason attached.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> InitDataVerification {
    let params = parse_init_data(init_data);

    let Some(hash) = params
        .iter()
        .find(|(k, _)| k == "hash")
        .map(|(_, v)| v.clone())
        .filter(|h| !h.is_empty())
    else {
        return InitDataVerification::reject(Rejection::MissingHash);
    };

    let remaining: Vec<&(String, String)> = params.iter().filter(|(k, _)| k != "hash").collect();
    let pairs: Vec<(&str, &str)> = remaining
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let calculated = compute_hash(&data_check_string(&pairs), bot_token);
    if !constant_time_eq(&calculated, &hash) {
        return InitDataVerification::reject(Rejection::HashMismatch);
    }

    let Some(user_raw) = lookup(&pairs, "user") else {
        return InitDataVerification::reject(Rejection::MissingUser);
    };
    let user: TelegramUser = match serde_json::from_str(user_raw) {
        Ok(user) => user,
        Err(_) => return InitDataVerification::reject(Rejection::MalformedUser),
    };

    InitDataVerification {
        valid: true,
        user: Some(user),
        auth_date: lookup(&pairs, "auth_date").and_then(|v| v.parse().ok()),
        reason: None,
    }
}

/// Returns true when `auth_date` lies within `max_age_secs` of `now`.
/// A missing auth_date is treated as stale.
pub fn check_auth_date(auth_date: Option<i64>, now: i64, max_age_secs: i64) -> bool {
    match auth_date {
        Some(ts) => now.saturating_sub(ts) <= max_age_secs,
        None => false,
    }
}

/// Produces a signed initData query string. Pair order is preserved in the
/// output; the signature covers the sorted data-check-string.
pub fn sign_init_data(pairs: &[(&str, &str)], bot_token: &str) -> String {
    let hash = compute_hash(&data_check_string(pairs), bot_token);
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        ser.append_pair(k, v);
    }
    ser.append_pair("hash", &hash);
    ser.finish()
}

fn lookup<'a>(pairs: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456:TEST-token";

    fn signed_sample() -> String {
        sign_init_data(
            &[
                ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
                (
                    "user",
                    r#"{"id":279058397,"first_name":"Vlad","last_name":"","username":"vdkfrost","language_code":"ru"}"#,
                ),
                ("auth_date", "1662771648"),
            ],
            TOKEN,
        )
    }

    #[test]
    fn signed_init_data_round_trips() {
        let result = verify_init_data(&signed_sample(), TOKEN);
        assert!(result.valid);
        let user = result.user.unwrap();
        assert_eq!(user.id, 279058397);
        assert_eq!(user.username.as_deref(), Some("vdkfrost"));
        assert_eq!(result.auth_date, Some(1662771648));
    }

    #[test]
    fn known_scenario_with_flipped_hash() {
        let user = r#"{"id":42}"#;
        let dcs = format!("auth_date=1000\nuser={}", user);
        let hash = compute_hash(&dcs, "ABC123");
        let init = format!("user=%7B%22id%22%3A42%7D&auth_date=1000&hash={}", hash);

        let ok = verify_init_data(&init, "ABC123");
        assert!(ok.valid);
        assert_eq!(ok.user.unwrap().id, 42);

        let last = hash.chars().last().unwrap();
        let flipped = if last == '0' { '1' } else { '0' };
        let tampered = format!("{}{}", &init[..init.len() - 1], flipped);
        let bad = verify_init_data(&tampered, "ABC123");
        assert!(!bad.valid);
        assert!(bad.user.is_none());
        assert_eq!(bad.reason, Some(Rejection::HashMismatch));
    }

    #[test]
    fn tampering_any_value_invalidates() {
        let pairs = [
            ("auth_date", "1700000000"),
            ("query_id", "abcdef"),
            ("user", r#"{"id":7,"first_name":"Ann"}"#),
        ];
        let init = sign_init_data(&pairs, TOKEN);
        assert!(verify_init_data(&init, TOKEN).valid);

        let sig = init.rsplit("hash=").next().unwrap().to_string();
        for i in 0..pairs.len() {
            let mut changed: Vec<(String, String)> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let v = &mut changed[i].1;
            let first = v.remove(0);
            v.insert(0, if first == 'x' { 'y' } else { 'x' });

            let mut ser = url::form_urlencoded::Serializer::new(String::new());
            for (k, v) in &changed {
                ser.append_pair(k, v);
            }
            ser.append_pair("hash", &sig);
            assert!(!verify_init_data(&ser.finish(), TOKEN).valid, "field {}", i);
        }
    }

    #[test]
    fn verification_is_deterministic() {
        let init = signed_sample();
        let a = verify_init_data(&init, TOKEN);
        let b = verify_init_data(&init, TOKEN);
        assert_eq!(a, b);
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let user = r#"{"id":5}"#;
        let a = sign_init_data(&[("auth_date", "1"), ("user", user), ("query_id", "q")], TOKEN);
        let hash = a.rsplit("hash=").next().unwrap();

        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        ser.append_pair("hash", hash);
        ser.append_pair("query_id", "q");
        ser.append_pair("user", user);
        ser.append_pair("auth_date", "1");
        let b = ser.finish();

        let pa = parse_init_data(&a);
        let pb = parse_init_data(&b);
        let strip = |p: Vec<(String, String)>| -> Vec<(String, String)> {
            p.into_iter().filter(|(k, _)| k != "hash").collect()
        };
        assert_eq!(data_check_string(&strip(pa)), data_check_string(&strip(pb)));
        assert_eq!(verify_init_data(&a, TOKEN), verify_init_data(&b, TOKEN));
        assert!(verify_init_data(&b, TOKEN).valid);
    }

    #[test]
    fn missing_hash_fails_closed() {
        let r = verify_init_data("user=%7B%22id%22%3A1%7D&auth_date=1", TOKEN);
        assert!(!r.valid);
        assert_eq!(r.reason, Some(Rejection::MissingHash));

        let empty = verify_init_data("user=%7B%22id%22%3A1%7D&auth_date=1&hash=", TOKEN);
        assert!(!empty.valid);
        assert_eq!(empty.reason, Some(Rejection::MissingHash));
    }

    #[test]
    fn missing_or_malformed_user_fails_closed() {
        let no_user = sign_init_data(&[("auth_date", "1")], TOKEN);
        assert_eq!(
            verify_init_data(&no_user, TOKEN).reason,
            Some(Rejection::MissingUser)
        );

        let bad_user = sign_init_data(&[("auth_date", "1"), ("user", "{not json")], TOKEN);
        assert_eq!(
            verify_init_data(&bad_user, TOKEN).reason,
            Some(Rejection::MalformedUser)
        );

        let no_id = sign_init_data(&[("user", r#"{"first_name":"x"}"#)], TOKEN);
        assert!(!verify_init_data(&no_id, TOKEN).valid);
    }

    #[test]
    fn wrong_token_fails() {
        assert!(!verify_init_data(&signed_sample(), "other-token").valid);
    }

    #[test]
    fn garbage_input_does_not_panic() {
        for input in ["", "&&&", "hash", "hash=", "=%%%&hash=zz", "user=%FF%FE&hash=00"] {
            assert!(!verify_init_data(input, TOKEN).valid);
        }
    }

    #[test]
    fn data_check_string_sorts_by_key() {
        let pairs = [("b", "2"), ("a", "1"), ("c", "3")];
        assert_eq!(data_check_string(&pairs), "a=1\nb=2\nc=3");
    }

    #[test]
    fn auth_date_freshness() {
        assert!(check_auth_date(Some(1000), 1500, 600));
        assert!(!check_auth_date(Some(1000), 1700, 600));
        assert!(!check_auth_date(None, 1000, 600));
    }

    #[test]
    fn extreme_auth_date_does_not_overflow() {
        assert!(!check_auth_date(Some(i64::MIN), i64::MAX, 600));
        assert!(check_auth_date(Some(i64::MAX), i64::MIN, 600));
    }
}
