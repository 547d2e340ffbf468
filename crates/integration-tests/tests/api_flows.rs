//! Account, cart, checkout and wishlist flows over HTTP.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bz-cli migrate`)
//! - The API server running against it, with a raised auth rate limit
//!   (`BAZAAR_AUTH_RATE_LIMIT_BURST=1000 cargo run -p bazaar-api`)
//! - `BAZAAR_DATABASE_URL` pointing at the same database, for fixtures
//!
//! Run with: cargo test -p bazaar-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use bazaar_integration_tests::{
    base_url, fixture_pool, insert_product, money, session_client, unique_email,
};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

const PASSWORD: &str = "correct-horse-battery";

/// Register a fresh account and log the client in.
async fn logged_in_client() -> (Client, String) {
    let client = session_client();
    let base_url = base_url();
    let email = unique_email();

    let resp = client
        .post(format!("{base_url}/auth/register/"))
        .json(&json!({
            "email": email,
            "first_name": "Test",
            "last_name": "Buyer",
            "password": PASSWORD,
            "password_confirm": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/auth/login/"))
        .json(&json!({"email": email, "password": PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    (client, email)
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health_endpoints() {
    let client = session_client();
    let base_url = base_url();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Account
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_account_lifecycle() {
    let (client, email) = logged_in_client().await;
    let base_url = base_url();

    let profile: Value = client
        .get(format!("{base_url}/auth/profile/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["email"], json!(email));

    let resp = client
        .patch(format!("{base_url}/auth/profile/"))
        .json(&json!({"phone_number": "+996 555 123 456"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["phone_number"], json!("+996 555 123 456"));
    assert_eq!(updated["first_name"], json!("Test"));

    let resp = client
        .post(format!("{base_url}/auth/change-password/"))
        .json(&json!({"old_password": "wrong-password", "new_password": "another-long-one"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("old_password").is_some());

    let resp = client
        .post(format!("{base_url}/auth/logout/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base_url}/auth/profile/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_duplicate_registration_is_rejected() {
    let (_, email) = logged_in_client().await;

    let resp = session_client()
        .post(format!("{}/auth/register/", base_url()))
        .json(&json!({
            "email": email.to_uppercase(),
            "password": PASSWORD,
            "password_confirm": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("email").is_some());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_wrong_password_is_unauthorized() {
    let (_, email) = logged_in_client().await;

    let resp = session_client()
        .post(format!("{}/auth/login/", base_url()))
        .json(&json!({"email": email, "password": "not-the-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Cart and checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_to_order() {
    let pool = fixture_pool().await;
    let jacket = insert_product(&pool, "Jacket", Decimal::new(10000, 2), 10)
        .await
        .unwrap();
    let scarf = insert_product(&pool, "Scarf", Decimal::new(5000, 2), 0)
        .await
        .unwrap();

    let (client, _) = logged_in_client().await;
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": jacket, "quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Same product, no options: merged into the existing line
    let resp = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": jacket, "quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let merged: Value = resp.json().await.unwrap();
    assert_eq!(merged["quantity"], json!(2));
    assert_eq!(money(&merged["total"]), Some(Decimal::new(18000, 2)));

    let resp = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": scarf}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/checkout/"))
        .json(&json!({"note": "ring twice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(money(&order["total"]), Some(Decimal::new(23000, 2)));
    assert_eq!(order["note"], json!("ring twice"));
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));

    let cart: Value = client
        .get(format!("{base_url}/cart/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart, json!([]));

    let resp = client
        .get(format!("{base_url}/orders/{}/", order["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A second checkout finds nothing to order
    let resp = client
        .post(format!("{base_url}/checkout/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Cart is empty"}));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_quantity_rules() {
    let pool = fixture_pool().await;
    let product = insert_product(&pool, "Socks", Decimal::new(500, 2), 0)
        .await
        .unwrap();
    let (client, _) = logged_in_client().await;
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": product, "quantity": -2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("quantity").is_some());

    let line: Value = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": product, "quantity": 3}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = client
        .patch(format!("{base_url}/cart/{}/", line["id"]))
        .json(&json!({"quantity": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(format!("{base_url}/cart/{}/remove/", line["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_malformed_cart_bodies_are_field_keyed() {
    let pool = fixture_pool().await;
    let product = insert_product(&pool, "Mittens", Decimal::new(700, 2), 0)
        .await
        .unwrap();
    let (client, _) = logged_in_client().await;
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"quantity": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"product": "This field is required."}));

    let resp = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": product, "quantity": "abc"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"quantity": "A valid integer is required."}));

    let line: Value = client
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": product}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = client
        .patch(format!("{base_url}/cart/{}/", line["id"]))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"quantity": "This field is required."}));

    let resp = client
        .post(format!("{base_url}/cart/add/"))
        .header("content-type", "text/plain")
        .body("product=1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_other_users_orders_are_hidden() {
    let pool = fixture_pool().await;
    let product = insert_product(&pool, "Belt", Decimal::new(1500, 2), 0)
        .await
        .unwrap();
    let base_url = base_url();

    let (buyer, _) = logged_in_client().await;
    buyer
        .post(format!("{base_url}/cart/add/"))
        .json(&json!({"product": product}))
        .send()
        .await
        .unwrap();
    let order: Value = buyer
        .post(format!("{base_url}/checkout/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let (stranger, _) = logged_in_client().await;
    let resp = stranger
        .get(format!("{base_url}/orders/{}/", order["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Wishlist and contact
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wishlist_add_is_idempotent() {
    let pool = fixture_pool().await;
    let product = insert_product(&pool, "Umbrella", Decimal::new(2500, 2), 0)
        .await
        .unwrap();
    let (client, _) = logged_in_client().await;
    let base_url = base_url();

    for expected in [StatusCode::CREATED, StatusCode::OK] {
        let resp = client
            .post(format!("{base_url}/wishlist/add/"))
            .json(&json!({"product": product}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }

    let items: Value = client
        .get(format!("{base_url}/wishlist/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items.as_array().map(Vec::len), Some(1));

    for _ in 0..2 {
        let resp = client
            .delete(format!("{base_url}/wishlist/{product}/remove/"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_contact_form_validation() {
    let client = session_client();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/contact/"))
        .json(&json!({"name": "Aida", "email": "not-an-email", "message": "Hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("email").is_some());

    let resp = client
        .post(format!("{base_url}/contact/"))
        .json(&json!({"name": "Aida", "email": "aida@example.com", "message": "Hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_review_updates_rating() {
    let pool = fixture_pool().await;
    let product = insert_product(&pool, "Teapot", Decimal::new(3500, 2), 0)
        .await
        .unwrap();
    let slug: String = sqlx::query_scalar("SELECT slug FROM shop.product WHERE id = $1")
        .bind(product)
        .fetch_one(&pool)
        .await
        .unwrap();
    let client = session_client();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/products/{slug}/reviews/create/"))
        .json(&json!({"name": "Aida", "rating": 6, "text": "Too good"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("rating").is_some());

    for rating in [5, 4] {
        let resp = client
            .post(format!("{base_url}/products/{slug}/reviews/create/"))
            .json(&json!({"name": "Aida", "rating": rating, "text": "Pours well"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let (rating, count): (Decimal, i32) = sqlx::query_as(
        "SELECT rating, reviews_count FROM shop.product_statistic WHERE product_id = $1",
    )
    .bind(product)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rating, Decimal::new(450, 2));
    assert_eq!(count, 2);

    let reviews: Value = client
        .get(format!("{base_url}/products/{slug}/reviews/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reviews.as_array().map(Vec::len), Some(2));
}
