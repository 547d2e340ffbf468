//! Cart repository.
//!
//! Every cart write runs inside a transaction that first takes the buyer's
//! cart lock ([`CartRepository::lock_user`]). The lock is a transaction-scoped
//! advisory lock keyed by user, so writers for different users never wait on
//! each other and the lock is released by commit or rollback.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bazaar_core::checkout::CartLineSnapshot;
use bazaar_core::{CartLineId, Discount, OptionSignature, OptionValueId, ProductId, UserId, pricing};

use super::catalog::{PRODUCT_REF_COLUMNS, ProductRefRow};
use super::{RepositoryError, to_u32};
use crate::models::{CartLine, OptionLabel, ProductRef};

/// First key of the cart advisory lock; the second key is the user ID.
pub const CART_LOCK_NAMESPACE: i32 = 0x4341_5254;

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRefRow,
}

#[derive(sqlx::FromRow)]
struct OptionLabelRow {
    line_id: i32,
    id: OptionValueId,
    name: String,
    name_ru: String,
}

#[derive(sqlx::FromRow)]
struct MatchRow {
    id: CartLineId,
    quantity: i32,
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: CartLineId,
    product_id: ProductId,
    quantity: i32,
    option_signature: String,
    price: Decimal,
    sale: Discount,
}

impl TryFrom<SnapshotRow> for CartLineSnapshot {
    type Error = RepositoryError;

    fn try_from(r: SnapshotRow) -> Result<Self, Self::Error> {
        let options = r.option_signature.parse::<OptionSignature>().map_err(|e| {
            RepositoryError::DataCorruption(format!("cart line {}: {e}", r.id))
        })?;
        Ok(Self {
            id: r.id,
            product_id: r.product_id,
            quantity: to_u32(r.quantity, "cart_line.quantity")?,
            list_price: r.price,
            discount: r.sale,
            options,
        })
    }
}

/// An existing line that matches an add request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingLine {
    pub id: CartLineId,
    pub quantity: u32,
}

/// Repository for cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All cart lines of a user, oldest first, priced at current prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_lines(&mut conn, user, None).await
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Take the user's cart lock for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_user(conn: &mut PgConnection, user: UserId) -> Result<(), RepositoryError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(CART_LOCK_NAMESPACE)
            .bind(user)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Find the user's line for `product` with exactly this option set,
    /// locking it for update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_matching(
        conn: &mut PgConnection,
        user: UserId,
        product: ProductId,
        options: &OptionSignature,
    ) -> Result<Option<MatchingLine>, RepositoryError> {
        let row = sqlx::query_as::<_, MatchRow>(
            r"
            SELECT id, quantity
            FROM shop.cart_line
            WHERE user_id = $1 AND product_id = $2 AND option_signature = $3
            FOR UPDATE
            ",
        )
        .bind(user)
        .bind(product)
        .bind(options.key())
        .fetch_optional(conn)
        .await?;

        row.map(|r| {
            Ok(MatchingLine {
                id: r.id,
                quantity: to_u32(r.quantity, "cart_line.quantity")?,
            })
        })
        .transpose()
    }

    /// Insert a new line with its option values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an identical line already exists.
    pub async fn insert_line(
        conn: &mut PgConnection,
        user: UserId,
        product: ProductId,
        quantity: u32,
        options: &OptionSignature,
    ) -> Result<CartLineId, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartLineId>(
            r"
            INSERT INTO shop.cart_line (user_id, product_id, quantity, option_signature)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(user)
        .bind(product)
        .bind(to_db_quantity(quantity)?)
        .bind(options.key())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "cart line"))?;

        if !options.is_empty() {
            sqlx::query(
                r"
                INSERT INTO shop.cart_line_option_value (cart_line_id, option_value_id)
                SELECT $1, UNNEST($2::int4[])
                ",
            )
            .bind(id)
            .bind(options.raw_ids())
            .execute(&mut *conn)
            .await?;
        }

        Ok(id)
    }

    /// Set the quantity of a user's line. Returns `false` if no such line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        conn: &mut PgConnection,
        user: UserId,
        line: CartLineId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.cart_line SET quantity = $3 WHERE id = $1 AND user_id = $2")
                .bind(line)
                .bind(user)
                .bind(to_db_quantity(quantity)?)
                .execute(conn)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a user's line. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_line(
        conn: &mut PgConnection,
        user: UserId,
        line: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_line WHERE id = $1 AND user_id = $2")
            .bind(line)
            .bind(user)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete exactly the given lines of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_lines(
        conn: &mut PgConnection,
        user: UserId,
        lines: &[CartLineId],
    ) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = lines.iter().map(CartLineId::as_i32).collect();
        let result =
            sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1 AND id = ANY($2)")
                .bind(user)
                .bind(ids)
                .execute(conn)
                .await?;
        Ok(result.rows_affected())
    }

    /// Load one of the user's lines for a response.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_line(
        conn: &mut PgConnection,
        user: UserId,
        line: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(fetch_lines(conn, user, Some(line)).await?.pop())
    }

    /// Read and lock the user's lines for checkout.
    ///
    /// Cart rows are locked for update and their products for share, so
    /// neither the lines nor the prices they are charged at can change before
    /// the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored line is invalid.
    pub async fn lock_for_checkout(
        conn: &mut PgConnection,
        user: UserId,
    ) -> Result<Vec<CartLineSnapshot>, RepositoryError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r"
            SELECT cl.id, cl.product_id, cl.quantity, cl.option_signature, p.price, p.sale
            FROM shop.cart_line cl
            JOIN shop.product p ON p.id = cl.product_id
            WHERE cl.user_id = $1
            ORDER BY cl.id
            FOR UPDATE OF cl
            FOR SHARE OF p
            ",
        )
        .bind(user)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(CartLineSnapshot::try_from).collect()
    }
}

fn to_db_quantity(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} is out of range")))
}

/// Load a user's lines (or one line) with products and option labels.
async fn fetch_lines(
    conn: &mut PgConnection,
    user: UserId,
    only: Option<CartLineId>,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(&format!(
        r"
        SELECT cl.id, cl.quantity, {PRODUCT_REF_COLUMNS}
        FROM shop.cart_line cl
        JOIN shop.product p ON p.id = cl.product_id
        WHERE cl.user_id = $1 AND ($2::int4 IS NULL OR cl.id = $2)
        ORDER BY cl.id
        "
    ))
    .bind(user)
    .bind(only)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let line_ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
    let labels = sqlx::query_as::<_, OptionLabelRow>(
        r"
        SELECT lov.cart_line_id AS line_id, v.id, v.value AS name, v.value_ru AS name_ru
        FROM shop.cart_line_option_value lov
        JOIN shop.option_value v ON v.id = lov.option_value_id
        WHERE lov.cart_line_id = ANY($1)
        ORDER BY v.id
        ",
    )
    .bind(line_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_line: HashMap<i32, Vec<OptionLabel>> = HashMap::new();
    for label in labels {
        by_line.entry(label.line_id).or_default().push(OptionLabel {
            id: label.id,
            name: label.name,
            name_ru: label.name_ru,
        });
    }

    rows.into_iter()
        .map(|r| {
            let quantity = to_u32(r.quantity, "cart_line.quantity")?;
            let product = ProductRef::from(r.product);
            Ok(CartLine {
                id: r.id,
                total: pricing::line_total(product.price, product.sale, quantity),
                option_values: by_line.remove(&r.id.as_i32()).unwrap_or_default(),
                product,
                quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_row() {
        let row = SnapshotRow {
            id: CartLineId::new(3),
            product_id: ProductId::new(8),
            quantity: 2,
            option_signature: "5,1".to_string(),
            price: Decimal::new(10000, 2),
            sale: Discount::new(10).unwrap_or(Discount::NONE),
        };
        let snapshot = CartLineSnapshot::try_from(row).ok();
        let snapshot = snapshot.as_ref();
        assert_eq!(snapshot.map(|s| s.quantity), Some(2));
        assert_eq!(
            snapshot.map(|s| s.options.raw_ids()),
            Some(vec![1, 5])
        );
    }

    #[test]
    fn test_snapshot_rejects_corrupt_signature() {
        let row = SnapshotRow {
            id: CartLineId::new(3),
            product_id: ProductId::new(8),
            quantity: 1,
            option_signature: "1,,x".to_string(),
            price: Decimal::ONE,
            sale: Discount::NONE,
        };
        assert!(matches!(
            CartLineSnapshot::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
