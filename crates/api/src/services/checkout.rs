//! Checkout: turns the caller's cart into an order.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::checkout::{AssembledOrder, CheckoutError, assemble_order};
use bazaar_core::{OrderId, UserId};

use super::statistics::StatisticsRecorder;
use crate::db::{OrderRepository, PgCheckoutLedger, RepositoryError};
use crate::models::{Order, OrderReceipt};

/// Checkout failure, with storage errors from the Postgres ledger.
pub type CheckoutFailure = CheckoutError<RepositoryError>;

/// A committed order.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PlacedOrder {
    /// The order as read back after the commit.
    Stored(Order),
    /// Reading the order back failed; described from the checkout snapshot.
    Receipt(OrderReceipt),
}

impl PlacedOrder {
    #[must_use]
    pub const fn id(&self) -> OrderId {
        match self {
            Self::Stored(order) => order.id,
            Self::Receipt(receipt) => receipt.id,
        }
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        match self {
            Self::Stored(order) => order.total,
            Self::Receipt(receipt) => receipt.total,
        }
    }

    /// The stored order, if it was read back.
    #[must_use]
    pub fn into_stored(self) -> Option<Order> {
        match self {
            Self::Stored(order) => Some(order),
            Self::Receipt(_) => None,
        }
    }

    /// Pick the response for a committed order. The order is already placed,
    /// so a failed read-back only downgrades the body.
    fn from_reload(
        assembled: &AssembledOrder,
        reloaded: Result<Option<Order>, RepositoryError>,
    ) -> Self {
        match reloaded {
            Ok(Some(order)) => Self::Stored(order),
            Ok(None) => {
                tracing::warn!(order_id = %assembled.order.id, "Placed order not found on reload");
                Self::Receipt(OrderReceipt::from(assembled))
            }
            Err(error) => {
                tracing::warn!(
                    order_id = %assembled.order.id,
                    error = %error,
                    "Placed order could not be reloaded"
                );
                Self::Receipt(OrderReceipt::from(assembled))
            }
        }
    }
}

/// Runs order assembly inside one database transaction.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from everything in `buyer`'s cart.
    ///
    /// The order, its lines and the removal of the consumed cart lines are
    /// committed together or not at all. Sales counters are updated after the
    /// commit.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to buy, and
    /// `CheckoutError::Ledger` for storage failures before the commit.
    /// Nothing is written in either case.
    #[instrument(skip(self, note))]
    pub async fn checkout(
        &self,
        buyer: UserId,
        note: &str,
    ) -> Result<PlacedOrder, CheckoutFailure> {
        let mut tx = self.pool.begin().await.map_err(ledger_error)?;

        let result = {
            let mut ledger = PgCheckoutLedger::new(&mut tx);
            assemble_order(&mut ledger, buyer, note).await
        };
        let assembled = match result {
            Ok(assembled) => assembled,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "Checkout rollback failed");
                }
                return Err(e);
            }
        };
        tx.commit().await.map_err(ledger_error)?;

        tracing::info!(
            order_id = %assembled.order.id,
            lines = assembled.lines.len(),
            total = %assembled.order.total,
            "Order placed"
        );

        StatisticsRecorder::new(self.pool).order_placed(&assembled).await;

        let reloaded = OrderRepository::new(self.pool)
            .get_for_buyer(buyer, assembled.order.id)
            .await;
        Ok(PlacedOrder::from_reload(&assembled, reloaded))
    }
}

fn ledger_error(err: sqlx::Error) -> CheckoutFailure {
    CheckoutError::Ledger(RepositoryError::Database(err))
}
