//! Order assembly: turning a user's cart into an immutable order.
//!
//! [`assemble_order`] is the whole checkout workflow. It is written against
//! [`CheckoutLedger`], the storage-side view of a single transaction, and
//! never commits anything itself: the caller opens the ledger, runs the
//! workflow and commits only on `Ok`. Any error (including a failure halfway
//! through writing order lines) is returned before the commit, so dropping or
//! rolling back the ledger leaves no order, no order lines and an untouched
//! cart.
//!
//! Implementations must make [`CheckoutLedger::lock_cart`] exclude concurrent
//! cart writers for the same buyer until the transaction ends.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::options::OptionSignature;
use crate::pricing;
use crate::types::{CartLineId, Discount, OrderId, OrderLineId, OrderStatus, ProductId, UserId};

/// A cart line as read under lock at checkout, priced with the product's
/// current list price and discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineSnapshot {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub list_price: Decimal,
    pub discount: Discount,
    pub options: OptionSignature,
}

/// The values an order line is created with.
///
/// Price and discount are copied from the product at checkout and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineDraft {
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub discount: Discount,
    pub quantity: u32,
    #[serde(skip)]
    pub options: OptionSignature,
}

impl OrderLineDraft {
    /// Snapshot a cart line.
    #[must_use]
    pub fn from_cart_line(line: &CartLineSnapshot) -> Self {
        Self {
            product_id: line.product_id,
            unit_price: line.list_price,
            discount: line.discount,
            quantity: line.quantity,
            options: line.options.clone(),
        }
    }

    /// `unit_price * (1 - discount/100) * quantity`, in cents.
    #[must_use]
    pub fn total(&self) -> Decimal {
        pricing::line_total(self.unit_price, self.discount, self.quantity)
    }
}

/// An order row as created by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHeader {
    pub id: OrderId,
    pub buyer: UserId,
    pub status: OrderStatus,
    pub total: Decimal,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// An order line written during assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledLine {
    pub id: OrderLineId,
    pub line: OrderLineDraft,
}

/// The result of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOrder {
    pub order: OrderHeader,
    pub lines: Vec<AssembledLine>,
    /// Cart lines consumed by this order.
    pub consumed: Vec<CartLineId>,
}

/// Storage operations for one checkout transaction.
pub trait CheckoutLedger {
    /// Storage error type.
    type Error;

    /// Read the buyer's cart lines and hold them until the transaction ends.
    async fn lock_cart(&mut self, buyer: UserId) -> Result<Vec<CartLineSnapshot>, Self::Error>;

    /// Insert an order with status `placed` and a total of zero.
    async fn create_order(&mut self, buyer: UserId, note: &str)
    -> Result<OrderHeader, Self::Error>;

    /// Insert one order line with its option values.
    async fn add_order_line(
        &mut self,
        order: OrderId,
        line: &OrderLineDraft,
    ) -> Result<OrderLineId, Self::Error>;

    /// Write the final order total.
    async fn set_order_total(&mut self, order: OrderId, total: Decimal)
    -> Result<(), Self::Error>;

    /// Delete the given cart lines of `buyer`, returning how many were removed.
    async fn remove_cart_lines(
        &mut self,
        buyer: UserId,
        lines: &[CartLineId],
    ) -> Result<u64, Self::Error>;
}

/// Why a checkout did not produce an order.
#[derive(Debug, Error)]
pub enum CheckoutError<E> {
    /// The buyer has nothing in their cart.
    #[error("Cart is empty")]
    EmptyCart,
    /// The locked cart lines could not all be removed.
    #[error("cart changed during checkout (expected to remove {expected} lines, removed {removed})")]
    CartChanged { expected: usize, removed: u64 },
    /// The storage engine failed.
    #[error("checkout storage error: {0}")]
    Ledger(#[source] E),
}

/// Run the checkout workflow on an open ledger.
///
/// Does not commit. On `Err` the caller must discard the ledger's writes.
///
/// # Errors
///
/// - [`CheckoutError::EmptyCart`] before any write if the cart is empty.
/// - [`CheckoutError::CartChanged`] if the locked lines were not all removed.
/// - [`CheckoutError::Ledger`] for any storage failure.
pub async fn assemble_order<L: CheckoutLedger>(
    ledger: &mut L,
    buyer: UserId,
    note: &str,
) -> Result<AssembledOrder, CheckoutError<L::Error>> {
    let cart = ledger
        .lock_cart(buyer)
        .await
        .map_err(CheckoutError::Ledger)?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut order = ledger
        .create_order(buyer, note)
        .await
        .map_err(CheckoutError::Ledger)?;

    let mut lines = Vec::with_capacity(cart.len());
    for cart_line in &cart {
        let draft = OrderLineDraft::from_cart_line(cart_line);
        let id = ledger
            .add_order_line(order.id, &draft)
            .await
            .map_err(CheckoutError::Ledger)?;
        lines.push(AssembledLine { id, line: draft });
    }

    let total = pricing::sum_totals(lines.iter().map(|l| l.line.total()));
    ledger
        .set_order_total(order.id, total)
        .await
        .map_err(CheckoutError::Ledger)?;
    order.total = total;

    let consumed: Vec<CartLineId> = cart.iter().map(|l| l.id).collect();
    let removed = ledger
        .remove_cart_lines(buyer, &consumed)
        .await
        .map_err(CheckoutError::Ledger)?;
    if usize::try_from(removed).ok() != Some(consumed.len()) {
        return Err(CheckoutError::CartChanged {
            expected: consumed.len(),
            removed,
        });
    }

    Ok(AssembledOrder {
        order,
        lines,
        consumed,
    })
}
