//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! # Repository tests: sqlx creates a scratch database per test
//! DATABASE_URL=postgres://localhost/bazaar \
//!     cargo test -p bazaar-integration-tests -- --ignored
//!
//! # HTTP tests additionally need a migrated database and a running server
//! bz-cli migrate
//! BAZAAR_AUTH_RATE_LIMIT_BURST=1000 cargo run -p bazaar-api &
//! BAZAAR_TEST_URL=http://localhost:8000 cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_db` - Cart and checkout against `PostgreSQL` (`#[sqlx::test]`)
//! - `api_flows` - Account, cart, checkout and wishlist over HTTP
//!
//! Fixtures are inserted with plain SQL since the API has no catalog
//! management endpoints.

use bazaar_core::{ProductId, UserId};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL of the running API server.
#[must_use]
pub fn base_url() -> String {
    std::env::var("BAZAAR_TEST_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// HTTP client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn session_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the database the running server uses, for fixtures.
///
/// # Panics
///
/// Panics if no database URL is set or the database is unreachable.
#[allow(clippy::expect_used)]
pub async fn fixture_pool() -> PgPool {
    let url = std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("BAZAAR_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("Failed to connect to database")
}

/// An email address no other test run uses.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// Insert a product with its statistics row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_product(
    pool: &PgPool,
    name: &str,
    price: Decimal,
    sale: i16,
) -> Result<ProductId, sqlx::Error> {
    let slug = format!("{}-{}", name.to_lowercase().replace(' ', "-"), Uuid::new_v4().simple());
    let id = sqlx::query_scalar::<_, ProductId>(
        r"
        INSERT INTO shop.product (name, slug, price, quantity, sale)
        VALUES ($1, $2, $3, 100, $4)
        RETURNING id
        ",
    )
    .bind(name)
    .bind(slug)
    .bind(price)
    .bind(sale)
    .fetch_one(pool)
    .await?;

    sqlx::query("INSERT INTO shop.product_statistic (product_id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(id)
}

/// Insert a filter type with the given values under a fresh category.
///
/// Returns the option value ids in input order.
///
/// # Errors
///
/// Returns an error if an insert fails.
pub async fn insert_option_values(pool: &PgPool, values: &[&str]) -> Result<Vec<i32>, sqlx::Error> {
    let category = sqlx::query_scalar::<_, i32>(
        "INSERT INTO shop.category (name, slug) VALUES ('Fixtures', $1) RETURNING id",
    )
    .bind(format!("fixtures-{}", Uuid::new_v4().simple()))
    .fetch_one(pool)
    .await?;

    let filter = sqlx::query_scalar::<_, i32>(
        "INSERT INTO shop.filter_type (category_id, name) VALUES ($1, 'Size') RETURNING id",
    )
    .bind(category)
    .fetch_one(pool)
    .await?;

    let mut ids = Vec::with_capacity(values.len());
    for value in values {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO shop.option_value (filter_type_id, value) VALUES ($1, $2) RETURNING id",
        )
        .bind(filter)
        .bind(value)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

/// Insert a user that cannot log in (placeholder password hash).
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_user(pool: &PgPool) -> Result<UserId, sqlx::Error> {
    sqlx::query_scalar::<_, UserId>(
        "INSERT INTO shop.user (email, password_hash) VALUES ($1, '!') RETURNING id",
    )
    .bind(unique_email())
    .fetch_one(pool)
    .await
}

/// Parse a money value serialized as a JSON string.
#[must_use]
pub fn money(value: &serde_json::Value) -> Option<Decimal> {
    value.as_str()?.parse().ok()
}
