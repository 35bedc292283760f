use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct DueWelcome {
    pub id: Uuid,
    pub telegram_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeMedia {
    Photo,
    Video,
}

/// Welcome message configuration read from `admin_settings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeSettings {
    pub enabled: bool,
    pub text: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
}

impl WelcomeSettings {
    /// Builds settings from key/value rows; empty values count as unset.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Option<String>)>) -> Self {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .filter_map(|(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k, v)))
            .collect();

        Self {
            enabled: map.get("welcome_message_enabled").map(String::as_str) != Some("false"),
            text: map.get("welcome_message_text").cloned(),
            media_url: map.get("welcome_message_media_url").cloned(),
            media_type: map.get("welcome_message_media_type").cloned(),
        }
    }

    /// Media attachment, only when both url and a known type are set.
    pub fn media(&self) -> Option<(WelcomeMedia, &str)> {
        let url = self.media_url.as_deref()?;
        match self.media_type.as_deref()? {
            "photo" => Some((WelcomeMedia::Photo, url)),
            "video" => Some((WelcomeMedia::Video, url)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WelcomeDispatch {
    pub sent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, Option<String>)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.to_string())))
            .collect()
    }

    #[test]
    fn enabled_unless_explicitly_false() {
        assert!(WelcomeSettings::from_pairs(vec![]).enabled);
        assert!(!WelcomeSettings::from_pairs(pairs(&[("welcome_message_enabled", "false")])).enabled);
        assert!(WelcomeSettings::from_pairs(pairs(&[("welcome_message_enabled", "true")])).enabled);
    }

    #[test]
    fn media_requires_url_and_known_type() {
        let s = WelcomeSettings::from_pairs(pairs(&[
            ("welcome_message_text", "hi"),
            ("welcome_message_media_url", "https://x/v.mp4"),
            ("welcome_message_media_type", "video"),
        ]));
        assert_eq!(s.media(), Some((WelcomeMedia::Video, "https://x/v.mp4")));

        let gif = WelcomeSettings::from_pairs(pairs(&[
            ("welcome_message_media_url", "https://x/a.gif"),
            ("welcome_message_media_type", "gif"),
        ]));
        assert_eq!(gif.media(), None);

        let empty_text = WelcomeSettings::from_pairs(pairs(&[("welcome_message_text", "")]));
        assert_eq!(empty_text.text, None);
    }
}
