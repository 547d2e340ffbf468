//! Cart and checkout against `PostgreSQL`.
//!
//! These tests require a `PostgreSQL` server reachable through `DATABASE_URL`;
//! `#[sqlx::test]` creates and migrates a scratch database for each test.
//!
//! Run with: cargo test -p bazaar-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use bazaar_api::db::{CartRepository, OrderRepository, RepositoryError};
use bazaar_api::models::Order;
use bazaar_api::services::cart::{AddLine, AddOutcome, CartError, UpdateOutcome};
use bazaar_api::services::{CartService, CheckoutService};
use bazaar_core::checkout::CheckoutError;
use bazaar_core::{ProductId, UserId};
use bazaar_integration_tests::{insert_option_values, insert_product, insert_user};
use rust_decimal::Decimal;
use sqlx::PgPool;

fn add(product: ProductId, quantity: i64, option_values: Vec<i32>) -> AddLine {
    AddLine::new(product, quantity, option_values)
}

async fn place(pool: &PgPool, user: UserId, note: &str) -> Order {
    CheckoutService::new(pool)
        .checkout(user, note)
        .await
        .unwrap()
        .into_stored()
        .unwrap()
}

async fn order_count(pool: &PgPool, user: UserId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM shop.customer_order WHERE buyer_id = $1")
        .bind(user)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn sold(pool: &PgPool, product: ProductId) -> i64 {
    sqlx::query_scalar("SELECT sold FROM shop.product_statistic WHERE product_id = $1")
        .bind(product)
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// Checkout
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_snapshots_prices_and_empties_cart(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();
    let a = insert_product(&pool, "Jacket", Decimal::new(10000, 2), 10)
        .await
        .unwrap();
    let b = insert_product(&pool, "Scarf", Decimal::new(5000, 2), 0)
        .await
        .unwrap();

    let cart = CartService::new(&pool);
    cart.add(user, &add(a, 2, vec![])).await.unwrap();
    cart.add(user, &add(b, 1, vec![])).await.unwrap();

    let order = place(&pool, user, "leave at the door").await;

    assert_eq!(order.total, Decimal::new(23000, 2));
    assert_eq!(order.note, "leave at the door");
    assert_eq!(order.items.len(), 2);

    let jacket = order.items.iter().find(|i| i.product.id == a).unwrap();
    assert_eq!(jacket.discount.percent(), 10);
    assert_eq!(jacket.quantity, 2);
    assert_eq!(jacket.total, Decimal::new(18000, 2));
    let scarf = order.items.iter().find(|i| i.product.id == b).unwrap();
    assert_eq!(scarf.discount.percent(), 0);
    assert_eq!(scarf.total, Decimal::new(5000, 2));

    assert!(cart.list(user).await.unwrap().is_empty());
    assert_eq!(sold(&pool, a).await, 2);
    assert_eq!(sold(&pool, b).await, 1);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_of_empty_cart_creates_nothing(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();

    let err = CheckoutService::new(&pool)
        .checkout(user, "")
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(order_count(&pool, user).await, 0);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_later_price_change_leaves_order_untouched(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();
    let product = insert_product(&pool, "Boots", Decimal::new(8000, 2), 25)
        .await
        .unwrap();

    CartService::new(&pool)
        .add(user, &add(product, 1, vec![]))
        .await
        .unwrap();
    let order = place(&pool, user, "").await;

    sqlx::query("UPDATE shop.product SET price = 999, sale = 0 WHERE id = $1")
        .bind(product)
        .execute(&pool)
        .await
        .unwrap();

    let reloaded = OrderRepository::new(&pool)
        .get_for_buyer(user, order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.total, Decimal::new(6000, 2));
    assert_eq!(reloaded.items[0].unit_price, Decimal::new(8000, 2));
    assert_eq!(reloaded.items[0].discount.percent(), 25);
    assert_eq!(reloaded.items[0].total, Decimal::new(6000, 2));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_checkouts_place_one_order(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();
    let product = insert_product(&pool, "Hat", Decimal::new(2000, 2), 0)
        .await
        .unwrap();
    CartService::new(&pool)
        .add(user, &add(product, 3, vec![]))
        .await
        .unwrap();

    let checkout = CheckoutService::new(&pool);
    let (first, second) = tokio::join!(checkout.checkout(user, ""), checkout.checkout(user, ""));

    let placed = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(placed, 1);
    let failed = if first.is_ok() { second } else { first };
    assert!(matches!(failed, Err(CheckoutError::EmptyCart)));
    assert_eq!(order_count(&pool, user).await, 1);
    assert_eq!(sold(&pool, product).await, 3);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_add_during_checkout_is_ordered_or_kept(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();
    let hat = insert_product(&pool, "Hat", Decimal::new(2000, 2), 0)
        .await
        .unwrap();
    let scarf = insert_product(&pool, "Scarf", Decimal::new(5000, 2), 20)
        .await
        .unwrap();

    let cart = CartService::new(&pool);
    cart.add(user, &add(hat, 1, vec![])).await.unwrap();

    let late = add(scarf, 2, vec![]);
    let checkout = CheckoutService::new(&pool);
    let (placed, added) = tokio::join!(checkout.checkout(user, ""), cart.add(user, &late));
    added.unwrap();
    let order = placed.unwrap().into_stored().unwrap();

    let remaining = cart.list(user).await.unwrap();
    if order.items.iter().any(|i| i.product.id == scarf) {
        // The add committed first and was priced into the order
        assert_eq!(order.items.len(), 2);
        assert!(remaining.is_empty());
    } else {
        // The add waited for the checkout and is still in the cart
        assert_eq!(order.items.len(), 1);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].product.id, scarf);
        assert_eq!(remaining[0].quantity, 2);
    }

    let sum: Decimal = order.items.iter().map(|i| i.total).sum();
    assert_eq!(order.total, sum);
    assert_eq!(order_count(&pool, user).await, 1);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_orders_are_private(pool: PgPool) {
    let buyer = insert_user(&pool).await.unwrap();
    let other = insert_user(&pool).await.unwrap();
    let product = insert_product(&pool, "Belt", Decimal::new(1500, 2), 0)
        .await
        .unwrap();
    CartService::new(&pool)
        .add(buyer, &add(product, 1, vec![]))
        .await
        .unwrap();
    let order = place(&pool, buyer, "").await;

    let orders = OrderRepository::new(&pool);
    assert!(orders.get_for_buyer(other, order.id).await.unwrap().is_none());
    assert!(orders.list_for_buyer(other).await.unwrap().is_empty());
    assert_eq!(orders.list_for_buyer(buyer).await.unwrap().len(), 1);
}

// =============================================================================
// Cart
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_same_options_in_any_order_merge(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();
    let product = insert_product(&pool, "Shirt", Decimal::new(3000, 2), 0)
        .await
        .unwrap();
    let values = insert_option_values(&pool, &["M", "L"]).await.unwrap();

    let cart = CartService::new(&pool);
    let first = cart
        .add(user, &add(product, 2, vec![values[0], values[1]]))
        .await
        .unwrap();
    assert!(matches!(first, AddOutcome::Created(_)));

    let second = cart
        .add(user, &add(product, 3, vec![values[1], values[0]]))
        .await
        .unwrap();
    let AddOutcome::Merged(line) = second else {
        panic!("expected the lines to merge");
    };
    assert_eq!(line.quantity, 5);

    // A different option set is a different line
    cart.add(user, &add(product, 1, vec![values[0]])).await.unwrap();
    assert_eq!(cart.list(user).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_quantity_zero_deletes_line(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();
    let product = insert_product(&pool, "Socks", Decimal::new(500, 2), 0)
        .await
        .unwrap();

    let cart = CartService::new(&pool);
    let AddOutcome::Created(line) = cart.add(user, &add(product, 1, vec![])).await.unwrap() else {
        panic!("expected a new line");
    };

    let outcome = cart
        .update(user, line.id, 0)
        .await
        .unwrap();
    assert!(matches!(outcome, UpdateOutcome::Deleted));
    assert!(cart.list(user).await.unwrap().is_empty());

    // Removing again is not an error
    cart.remove(user, line.id).await.unwrap();
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_negative_quantity_is_rejected(pool: PgPool) {
    let user = insert_user(&pool).await.unwrap();
    let product = insert_product(&pool, "Gloves", Decimal::new(1200, 2), 0)
        .await
        .unwrap();

    let cart = CartService::new(&pool);
    let err = cart.add(user, &add(product, -1, vec![])).await.unwrap_err();
    assert!(matches!(err, CartError::Invalid(ref errors) if errors.get("quantity").is_some()));
    assert!(cart.list(user).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_cart_lines_are_private(pool: PgPool) {
    let owner = insert_user(&pool).await.unwrap();
    let other = insert_user(&pool).await.unwrap();
    let product = insert_product(&pool, "Cap", Decimal::new(900, 2), 0)
        .await
        .unwrap();

    let cart = CartService::new(&pool);
    let AddOutcome::Created(line) = cart.add(owner, &add(product, 1, vec![])).await.unwrap() else {
        panic!("expected a new line");
    };

    let err = cart
        .update(other, line.id, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::NotFound));

    let mut conn = pool.acquire().await.unwrap();
    let untouched = CartRepository::get_line(&mut *conn, owner, line.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.quantity, 1);
}

#[test]
fn test_repository_error_display() {
    assert_eq!(RepositoryError::NotFound.to_string(), "not found");
}
