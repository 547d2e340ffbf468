//! Bazaar API library.
//!
//! Catalog browsing, a per-user cart, checkout into immutable orders and
//! session-based accounts, served as JSON over axum. The binary in `main.rs`
//! wires these modules into a server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
