//! Reviews, wishlist and contact models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{ContactMessageId, Email, ProductId, ReviewId, WishlistItemId};

/// A customer review of a product.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub name: String,
    pub email: Option<Email>,
    pub rating: i16,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A saved product.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub product: ProductId,
}

/// A message sent through the public contact form.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
