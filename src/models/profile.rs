use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub subscription_tier: Option<String>,
    pub referred_by: Option<Uuid>,
}

impl Profile {
    pub fn is_premium(&self) -> bool {
        self.subscription_tier.as_deref() == Some("premium")
    }

    /// `@username`, else first name, else `ID:<telegram_id>`.
    pub fn display_handle(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return format!("@{}", username);
        }
        if let Some(first) = self.first_name.as_deref().filter(|f| !f.is_empty()) {
            return first.to_string();
        }
        format!(
            "ID:{}",
            self.telegram_id.map(|id| id.to_string()).unwrap_or_default()
        )
    }
}
