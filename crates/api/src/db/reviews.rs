//! Product reviews.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{Email, ProductId, ReviewId};

use super::RepositoryError;
use crate::models::Review;

/// Reviews shown on a product page.
pub const REVIEW_LIST_LIMIT: i64 = 10;

/// Lowest rating that is displayed publicly.
pub const MIN_DISPLAYED_RATING: i16 = 4;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    name: String,
    email: Option<Email>,
    rating: i16,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            rating: r.rating,
            text: r.text,
            created_at: r.created_at,
        }
    }
}

/// Values of a new review.
#[derive(Debug, Clone)]
pub struct NewReview<'a> {
    pub product: ProductId,
    pub name: &'a str,
    pub email: Option<&'a Email>,
    pub rating: i16,
    pub text: &'a str,
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The newest well-rated reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(&self, product: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, name, email, rating, text, created_at
            FROM shop.product_review
            WHERE product_id = $1 AND rating >= $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            ",
        )
        .bind(product)
        .bind(MIN_DISPLAYED_RATING)
        .bind(REVIEW_LIST_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Store a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewReview<'_>) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO shop.product_review (product_id, name, email, rating, text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, rating, text, created_at
            ",
        )
        .bind(new.product)
        .bind(new.name)
        .bind(new.email)
        .bind(new.rating)
        .bind(new.text)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
