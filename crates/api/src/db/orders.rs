//! Order repository and the Postgres checkout ledger.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bazaar_core::checkout::{CartLineSnapshot, CheckoutLedger, OrderHeader, OrderLineDraft};
use bazaar_core::{
    CartLineId, Discount, OptionValueId, OrderId, OrderLineId, OrderStatus, UserId, pricing,
};

use super::cart::CartRepository;
use super::catalog::{PRODUCT_REF_COLUMNS, ProductRefRow};
use super::{RepositoryError, to_u32};
use crate::models::{OptionLabel, Order, OrderItem, ProductRef};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    buyer_id: UserId,
    status: OrderStatus,
    total: Decimal,
    note: String,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderHeader {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            buyer: r.buyer_id,
            status: r.status,
            total: r.total,
            note: r.note,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    unit_price: Decimal,
    discount: Discount,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRefRow,
}

#[derive(sqlx::FromRow)]
struct LineOptionRow {
    line_id: i32,
    id: OptionValueId,
    name: String,
    name_ru: String,
}

const ORDER_COLUMNS: &str = "id, buyer_id, status, total, note, created_at";

// =============================================================================
// Checkout ledger
// =============================================================================

/// [`CheckoutLedger`] over an open Postgres transaction.
///
/// The ledger borrows the connection; committing or rolling back stays with
/// the owner of the transaction.
pub struct PgCheckoutLedger<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgCheckoutLedger<'c> {
    /// Wrap a connection that is inside a transaction.
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl CheckoutLedger for PgCheckoutLedger<'_> {
    type Error = RepositoryError;

    async fn lock_cart(&mut self, buyer: UserId) -> Result<Vec<CartLineSnapshot>, Self::Error> {
        CartRepository::lock_user(&mut *self.conn, buyer).await?;
        CartRepository::lock_for_checkout(&mut *self.conn, buyer).await
    }

    async fn create_order(&mut self, buyer: UserId, note: &str) -> Result<OrderHeader, Self::Error> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.customer_order (buyer_id, status, total, note)
            VALUES ($1, $2, 0, $3)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(buyer)
        .bind(OrderStatus::Placed)
        .bind(note)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(row.into())
    }

    async fn add_order_line(
        &mut self,
        order: OrderId,
        line: &OrderLineDraft,
    ) -> Result<OrderLineId, Self::Error> {
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("order quantity {} out of range", line.quantity))
        })?;

        let id = sqlx::query_scalar::<_, OrderLineId>(
            r"
            INSERT INTO shop.order_line (order_id, product_id, unit_price, discount, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(order)
        .bind(line.product_id)
        .bind(line.unit_price)
        .bind(line.discount)
        .bind(quantity)
        .fetch_one(&mut *self.conn)
        .await?;

        if !line.options.is_empty() {
            sqlx::query(
                r"
                INSERT INTO shop.order_line_option_value (order_line_id, option_value_id)
                SELECT $1, UNNEST($2::int4[])
                ",
            )
            .bind(id)
            .bind(line.options.raw_ids())
            .execute(&mut *self.conn)
            .await?;
        }

        Ok(id)
    }

    async fn set_order_total(&mut self, order: OrderId, total: Decimal) -> Result<(), Self::Error> {
        let result = sqlx::query("UPDATE shop.customer_order SET total = $2 WHERE id = $1")
            .bind(order)
            .bind(total)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn remove_cart_lines(
        &mut self,
        buyer: UserId,
        lines: &[CartLineId],
    ) -> Result<u64, Self::Error> {
        CartRepository::delete_lines(&mut *self.conn, buyer, lines).await
    }
}

// =============================================================================
// Order history
// =============================================================================

/// Read access to placed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders of a buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>, RepositoryError> {
        let headers = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.customer_order
            WHERE buyer_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(buyer)
        .fetch_all(self.pool)
        .await?;

        self.with_items(headers).await
    }

    /// One order, only if it belongs to `buyer`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_buyer(
        &self,
        buyer: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let header = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1 AND buyer_id = $2"
        ))
        .bind(id)
        .bind(buyer)
        .fetch_optional(self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };
        Ok(self.with_items(vec![header]).await?.pop())
    }

    /// Attach lines and their option labels to order headers.
    async fn with_items(&self, headers: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = headers.iter().map(|h| h.id.as_i32()).collect();
        let lines = sqlx::query_as::<_, OrderLineRow>(&format!(
            r"
            SELECT ol.id, ol.order_id, ol.unit_price, ol.discount, ol.quantity, {PRODUCT_REF_COLUMNS}
            FROM shop.order_line ol
            JOIN shop.product p ON p.id = ol.product_id
            WHERE ol.order_id = ANY($1)
            ORDER BY ol.id
            "
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let line_ids: Vec<i32> = lines.iter().map(|l| l.id.as_i32()).collect();
        let options = sqlx::query_as::<_, LineOptionRow>(
            r"
            SELECT lov.order_line_id AS line_id, v.id, v.value AS name, v.value_ru AS name_ru
            FROM shop.order_line_option_value lov
            JOIN shop.option_value v ON v.id = lov.option_value_id
            WHERE lov.order_line_id = ANY($1)
            ORDER BY v.id
            ",
        )
        .bind(line_ids)
        .fetch_all(self.pool)
        .await?;

        let mut labels: HashMap<i32, Vec<OptionLabel>> = HashMap::new();
        for option in options {
            labels.entry(option.line_id).or_default().push(OptionLabel {
                id: option.id,
                name: option.name,
                name_ru: option.name_ru,
            });
        }

        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for line in lines {
            let quantity = to_u32(line.quantity, "order_line.quantity")?;
            items.entry(line.order_id).or_default().push(OrderItem {
                id: line.id,
                product: ProductRef::from(line.product),
                unit_price: line.unit_price,
                quantity,
                discount: line.discount,
                option_values: labels.remove(&line.id.as_i32()).unwrap_or_default(),
                total: pricing::line_total(line.unit_price, line.discount, quantity),
            });
        }

        Ok(headers
            .into_iter()
            .map(|h| Order {
                items: items.remove(&h.id).unwrap_or_default(),
                id: h.id,
                status: h.status,
                total: h.total,
                note: h.note,
                created_at: h.created_at,
            })
            .collect())
    }
}
