use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::product_dto::ProductInput;
use crate::error::Result;
use crate::models::product::Product;
use crate::utils::media::media_type_for_url;

/// Premium members may list at most this many products.
pub const MAX_PRODUCTS_PER_USER: i64 = 1;

const PRODUCT_COLUMNS: &str = r#"
    id, user_profile_id, title, description, price::float8 AS price,
    COALESCE(currency, 'RUB') AS currency, media_url, media_type, link,
    COALESCE(status, 'pending') AS status, rejection_reason, short_code,
    created_at, updated_at
"#;

#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_owner(&self, profile_id: Uuid) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM user_products WHERE user_profile_id = $1 ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn count_by_owner(&self, profile_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_products WHERE user_profile_id = $1")
                .bind(profile_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn owner_of(&self, product_id: Uuid) -> Result<Option<Uuid>> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT user_profile_id FROM user_products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(owner,)| owner))
    }

    pub async fn create(&self, profile_id: Uuid, input: &ProductInput) -> Result<Product> {
        let sql = format!(
            r#"
            INSERT INTO user_products
                (user_profile_id, title, description, price, currency, media_url, media_type, link, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(profile_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.currency.as_deref().unwrap_or("RUB"))
            .bind(&input.media_url)
            .bind(input.media_url.as_deref().map(media_type_for_url))
            .bind(&input.link)
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    /// Replaces the editable fields and sends the product back to moderation.
    pub async fn update(&self, product_id: Uuid, input: &ProductInput) -> Result<Product> {
        let sql = format!(
            r#"
            UPDATE user_products
            SET title = $2, description = $3, price = $4, currency = $5,
                media_url = $6, media_type = $7, link = $8,
                status = 'pending', rejection_reason = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(product_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.currency.as_deref().unwrap_or("RUB"))
            .bind(&input.media_url)
            .bind(input.media_url.as_deref().map(media_type_for_url))
            .bind(&input.link)
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn delete(&self, product_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM user_products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
