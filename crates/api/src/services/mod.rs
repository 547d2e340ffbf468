//! Business logic services.
//!
//! Services sit between route handlers and repositories: they validate
//! requests, own transactions and run post-commit hooks.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod statistics;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService};
pub use checkout::{CheckoutFailure, CheckoutService, PlacedOrder};
pub use statistics::StatisticsRecorder;
