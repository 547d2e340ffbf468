//! Product counters: views, units sold and review rating.
//!
//! Counter rows are created lazily, so every write is an upsert.

use sqlx::PgPool;

use bazaar_core::ProductId;

use super::RepositoryError;

/// Repository for `shop.product_statistic`.
pub struct StatisticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatisticsRepository<'a> {
    /// Create a new statistics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count one product page view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn increment_views(&self, product: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.product_statistic (product_id, views)
            VALUES ($1, 1)
            ON CONFLICT (product_id)
            DO UPDATE SET views = shop.product_statistic.views + 1
            ",
        )
        .bind(product)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Add sold units to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_sold(&self, product: ProductId, quantity: u32) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.product_statistic (product_id, sold)
            VALUES ($1, $2)
            ON CONFLICT (product_id)
            DO UPDATE SET sold = shop.product_statistic.sold + EXCLUDED.sold
            ",
        )
        .bind(product)
        .bind(i64::from(quantity))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Recompute the average rating and review count from all reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn refresh_rating(&self, product: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.product_statistic (product_id, rating, reviews_count)
            SELECT $1, COALESCE(ROUND(AVG(rating), 2), 0), COUNT(*)::int4
            FROM shop.product_review
            WHERE product_id = $1
            ON CONFLICT (product_id)
            DO UPDATE SET rating = EXCLUDED.rating, reviews_count = EXCLUDED.reviews_count
            ",
        )
        .bind(product)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
