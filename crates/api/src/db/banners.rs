//! Promotional banners.

use sqlx::PgPool;

use bazaar_core::BannerId;

use super::RepositoryError;
use crate::models::Banner;

#[derive(sqlx::FromRow)]
struct BannerRow {
    id: BannerId,
    image: String,
    alt: String,
}

pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All banners in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, BannerRow>("SELECT id, image, alt FROM shop.banner ORDER BY id")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Banner {
                id: r.id,
                image: r.image,
                alt: r.alt,
            })
            .collect())
    }
}
