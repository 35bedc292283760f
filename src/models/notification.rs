use serde::Serialize;
use serde_json::Value as JsonValue;

/// Client-side notification tab, mapped onto stored notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationFilter {
    All,
    Likes,
    Comments,
    Rep,
    Articles,
    Favorites,
    Badges,
}

impl NotificationFilter {
    /// Unknown filters fall back to `All`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("likes") => Self::Likes,
            Some("comments") => Self::Comments,
            Some("rep") => Self::Rep,
            Some("articles") => Self::Articles,
            Some("favorites") => Self::Favorites,
            Some("badges") => Self::Badges,
            _ => Self::All,
        }
    }

    /// Stored types matching this filter; `None` means no restriction.
    pub fn types(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::All => None,
            Self::Likes => Some(&["like"]),
            Self::Comments => Some(&["comment", "reply", "mention"]),
            Self::Rep => Some(&["rep"]),
            Self::Articles => Some(&["article_approved", "article_rejected"]),
            Self::Favorites => Some(&["favorite"]),
            Self::Badges => Some(&["badge"]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<JsonValue>,
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_map_to_types() {
        assert_eq!(NotificationFilter::parse(None).types(), None);
        assert_eq!(NotificationFilter::parse(Some("all")).types(), None);
        assert_eq!(NotificationFilter::parse(Some("bogus")), NotificationFilter::All);
        assert_eq!(
            NotificationFilter::parse(Some("comments")).types(),
            Some(&["comment", "reply", "mention"][..])
        );
        assert_eq!(
            NotificationFilter::parse(Some("articles")).types(),
            Some(&["article_approved", "article_rejected"][..])
        );
    }
}
