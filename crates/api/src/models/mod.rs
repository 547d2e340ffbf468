//! Domain models for the API.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod session;
pub mod user;

pub use account::{ContactMessage, Review, WishlistItem};
pub use cart::{CartLine, OptionLabel, Order, OrderItem, OrderReceipt, ReceiptItem};
pub use catalog::{
    Banner, Category, DescriptionItem, FilterGroup, FilterListing, OptionValue, ProductCard,
    ProductDetail, ProductImage, ProductPage, ProductProperty, ProductRef, ProductStatistics,
    SubCategory,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Profile, User};
