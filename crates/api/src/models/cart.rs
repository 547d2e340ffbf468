//! Cart and order response models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::checkout::AssembledOrder;
use bazaar_core::{
    CartLineId, Discount, OptionValueId, OrderId, OrderLineId, OrderStatus, ProductId,
};

use super::catalog::ProductRef;

/// An option value as shown on a cart or order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionLabel {
    pub id: OptionValueId,
    pub name: String,
    pub name_ru: String,
}

/// A cart line priced with the product's current price and discount.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product: ProductRef,
    pub quantity: u32,
    pub option_values: Vec<OptionLabel>,
    pub total: Decimal,
}

/// A placed order with its line snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Decimal,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One order line, priced as it was at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderLineId,
    pub product: ProductRef,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub discount: Discount,
    pub option_values: Vec<OptionLabel>,
    pub total: Decimal,
}

/// A committed order described from its checkout snapshot, without the
/// product and option details a stored [`Order`] carries.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Decimal,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptItem {
    pub id: OrderLineId,
    pub product: ProductId,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub discount: Discount,
    pub total: Decimal,
}

impl From<&AssembledOrder> for OrderReceipt {
    fn from(assembled: &AssembledOrder) -> Self {
        let header = &assembled.order;
        Self {
            id: header.id,
            status: header.status,
            total: header.total,
            note: header.note.clone(),
            created_at: header.created_at,
            items: assembled
                .lines
                .iter()
                .map(|l| ReceiptItem {
                    id: l.id,
                    product: l.line.product_id,
                    unit_price: l.line.unit_price,
                    quantity: l.line.quantity,
                    discount: l.line.discount,
                    total: l.line.total(),
                })
                .collect(),
        }
    }
}
