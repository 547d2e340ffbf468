//! Bazaar Core - domain types and the checkout workflow.
//!
//! This crate is shared by every Bazaar component:
//! - `api` - the HTTP backend (catalog, cart, checkout, accounts)
//! - `cli` - migrations, catalog seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and traits - no I/O,
//! no database access, no HTTP. Storage engines plug into the checkout
//! workflow by implementing [`checkout::CheckoutLedger`].
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, discounts and statuses
//! - [`pricing`] - Exact decimal line pricing
//! - [`options`] - Canonical option-value signatures for cart line matching
//! - [`validation`] - Field-keyed validation errors
//! - [`checkout`] - Cart to order assembly
//! - [`slug`] - URL slug generation for catalog entities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod options;
pub mod pricing;
pub mod slug;
pub mod types;
pub mod validation;

pub use options::OptionSignature;
pub use types::*;
pub use validation::ValidationErrors;
