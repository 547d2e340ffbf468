//! Wishlist repository.

use sqlx::PgPool;

use bazaar_core::{ProductId, UserId, WishlistItemId};

use super::RepositoryError;
use crate::models::WishlistItem;

#[derive(sqlx::FromRow)]
struct WishlistRow {
    id: WishlistItemId,
    product_id: ProductId,
}

impl From<WishlistRow> for WishlistItem {
    fn from(r: WishlistRow) -> Self {
        Self {
            id: r.id,
            product: r.product_id,
        }
    }
}

/// Repository for saved products.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's saved products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user: UserId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            "SELECT id, product_id FROM shop.wishlist_item WHERE user_id = $1 ORDER BY id",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(WishlistItem::from).collect())
    }

    /// Save a product. Saving it twice returns the existing item.
    ///
    /// The flag is `true` if a new item was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<(WishlistItem, bool), RepositoryError> {
        let inserted = sqlx::query_as::<_, WishlistRow>(
            r"
            INSERT INTO shop.wishlist_item (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            RETURNING id, product_id
            ",
        )
        .bind(user)
        .bind(product)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let existing = sqlx::query_as::<_, WishlistRow>(
            "SELECT id, product_id FROM shop.wishlist_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user)
        .bind(product)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok((existing.into(), false))
    }

    /// Remove a saved product. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.wishlist_item WHERE user_id = $1 AND product_id = $2")
                .bind(user)
                .bind(product)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
