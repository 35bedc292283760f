use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::payment_dto::SubscriptionPurchase;
use crate::error::{Error, Result};
use crate::services::notification_service::NotificationService;
use crate::utils::time::{now, plan_expiry};

/// Share of a referred user's purchase credited to the referrer.
pub const REFERRAL_RATE: f64 = 0.2;

pub const SUBSCRIPTION_NOTIFICATION: &str = "subscription";

#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub profile_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub referral_earning: Option<f64>,
}

pub fn activation_message(plan: &str) -> String {
    let name = if plan == "plus" { "Plus" } else { "Premium" };
    format!("🎉 Подписка {} успешно активирована!", name)
}

#[derive(Clone)]
pub struct SubscriptionService {
    pool: PgPool,
}

impl SubscriptionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Activates a paid plan for the buyer, credits the referrer if any and
    /// leaves an in-app notification, all in one transaction.
    pub async fn activate(&self, purchase: &SubscriptionPurchase, amount: f64) -> Result<Activation> {
        let mut tx = self.pool.begin().await?;

        let profile: Option<(Uuid, Option<Uuid>)> = sqlx::query_as(
            "SELECT id, referred_by FROM profiles WHERE telegram_id = $1 FOR UPDATE",
        )
        .bind(purchase.telegram_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (profile_id, referred_by) =
            profile.ok_or_else(|| Error::NotFound("User not found".into()))?;

        let expires_at = plan_expiry(now(), &purchase.period);

        sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_tier = $1, is_premium = true, premium_expires_at = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&purchase.plan)
        .bind(expires_at)
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;

        let mut referral_earning = None;
        if let Some(referrer_id) = referred_by {
            let earning = amount * REFERRAL_RATE;

            sqlx::query(
                r#"
                INSERT INTO referral_earnings
                    (referrer_id, referred_id, purchase_type, purchase_amount, earning_amount)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(referrer_id)
            .bind(profile_id)
            .bind(format!("{}_{}", purchase.plan, purchase.period))
            .bind(amount)
            .bind(earning)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE profiles SET referral_earnings = COALESCE(referral_earnings, 0) + $1 WHERE id = $2",
            )
            .bind(earning)
            .bind(referrer_id)
            .execute(&mut *tx)
            .await?;

            referral_earning = Some(earning);
        }

        NotificationService::create(
            &mut *tx,
            profile_id,
            SUBSCRIPTION_NOTIFICATION,
            &activation_message(&purchase.plan),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            telegram_id = purchase.telegram_id,
            plan = %purchase.plan,
            period = %purchase.period,
            %expires_at,
            "Subscription activated"
        );

        Ok(Activation {
            profile_id,
            expires_at,
            referral_earning,
        })
    }
}
