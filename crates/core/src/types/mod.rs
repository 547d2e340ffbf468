//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod discount;
pub mod email;
pub mod id;
pub mod status;

pub use discount::{Discount, DiscountError};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
