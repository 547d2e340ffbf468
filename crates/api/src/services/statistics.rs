//! Post-commit statistics hooks.
//!
//! Counters are best effort: they run after the business transaction has
//! committed, and a failure is logged without failing the request.

use sqlx::PgPool;

use bazaar_core::ProductId;
use bazaar_core::checkout::AssembledOrder;

use crate::db::StatisticsRepository;

/// Records product views, sales and rating changes.
pub struct StatisticsRecorder<'a> {
    stats: StatisticsRepository<'a>,
}

impl<'a> StatisticsRecorder<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stats: StatisticsRepository::new(pool),
        }
    }

    /// Count a product page view.
    pub async fn product_viewed(&self, product: ProductId) {
        if let Err(e) = self.stats.increment_views(product).await {
            tracing::warn!(product_id = %product, error = %e, "Failed to count product view");
        }
    }

    /// Add every line of a placed order to its product's sold counter.
    pub async fn order_placed(&self, order: &AssembledOrder) {
        for line in &order.lines {
            let product = line.line.product_id;
            if let Err(e) = self.stats.add_sold(product, line.line.quantity).await {
                tracing::warn!(
                    order_id = %order.order.id,
                    product_id = %product,
                    error = %e,
                    "Failed to record sold units"
                );
            }
        }
    }

    /// Recompute rating and review count after a new review.
    pub async fn review_added(&self, product: ProductId) {
        if let Err(e) = self.stats.refresh_rating(product).await {
            tracing::warn!(product_id = %product, error = %e, "Failed to refresh product rating");
        }
    }
}
