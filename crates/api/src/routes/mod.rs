//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog (public)
//! GET    /products/                               - Product listing (home, subcategory or search)
//! GET    /products/categories/                    - Categories by popularity (?home=1 for top 10)
//! GET    /products/categories/{slug}/             - One category
//! GET    /products/categories/{slug}/subcategories/
//! GET    /products/subcategories/{slug}/          - One subcategory
//! GET    /products/filters/?subcategory=slug      - Filters and price range
//! GET    /products/search/?search=q               - Best matching subcategory
//! GET    /products/{slug}/                        - Product detail (counts a view)
//! GET    /products/{slug}/reviews/                - Latest good reviews
//! POST   /products/{slug}/reviews/create/         - Submit a review
//! GET    /banners/                                - Promo banners
//!
//! # Cart and orders (requires auth)
//! GET    /cart/                                   - Cart lines
//! POST   /cart/add/                               - Add or merge a line
//! PATCH  /cart/{id}/                              - Set quantity (<= 0 deletes)
//! DELETE /cart/{id}/remove/                       - Remove a line
//! POST   /checkout/                               - Place an order from the cart
//! GET    /orders/                                 - Order history
//! GET    /orders/{id}/                            - One order
//!
//! # Account
//! POST   /auth/register/                          - Register (rate limited)
//! POST   /auth/login/                             - Start a session (rate limited)
//! POST   /auth/logout/                            - End the session
//! GET    /auth/profile/                           - Profile (requires auth)
//! PATCH  /auth/profile/                           - Update profile (requires auth)
//! POST   /auth/change-password/                   - Change password (requires auth, rate limited)
//! GET    /wishlist/                               - Saved products (requires auth)
//! POST   /wishlist/add/                           - Save a product (requires auth)
//! DELETE /wishlist/{product_id}/remove/           - Unsave a product (requires auth)
//! POST   /contact/                                - Contact form
//! ```

pub mod auth;
pub mod cart;
pub mod contact;
pub mod orders;
pub mod products;
pub mod wishlist;

use std::num::NonZeroU32;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::config::ApiConfig;

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create all API routes.
pub fn routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(cart_routes())
        .merge(account_routes())
        .merge(auth_routes(config.auth_rate_limit_burst))
}

/// Static segments under `/products/` that a product slug must not take.
pub const RESERVED_PRODUCT_SLUGS: [&str; 4] = ["categories", "subcategories", "filters", "search"];

/// Public catalog routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", get(products::list))
        .route("/products/categories/", get(products::categories))
        .route("/products/categories/{slug}/", get(products::category))
        .route(
            "/products/categories/{slug}/subcategories/",
            get(products::subcategories),
        )
        .route("/products/subcategories/{slug}/", get(products::subcategory))
        .route("/products/filters/", get(products::filters))
        .route("/products/search/", get(products::search))
        .route("/products/{slug}/", get(products::detail))
        .route("/products/{slug}/reviews/", get(products::reviews))
        .route(
            "/products/{slug}/reviews/create/",
            post(products::create_review),
        )
        .route("/banners/", get(products::banners))
}

/// Cart, checkout and order history routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/", get(cart::list))
        .route("/cart/add/", post(cart::add))
        .route("/cart/{id}/", patch(cart::update))
        .route("/cart/{id}/remove/", delete(cart::remove))
        .route("/checkout/", post(orders::checkout))
        .route("/orders/", get(orders::list))
        .route("/orders/{id}/", get(orders::detail))
}

/// Profile, wishlist and contact routes.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout/", post(auth::logout))
        .route(
            "/auth/profile/",
            get(auth::profile).patch(auth::update_profile),
        )
        .route("/wishlist/", get(wishlist::list))
        .route("/wishlist/add/", post(wishlist::add))
        .route("/wishlist/{product_id}/remove/", delete(wishlist::remove))
        .route("/contact/", post(contact::create))
}

/// Credential-checking routes, rate limited per client IP.
pub fn auth_routes(burst: NonZeroU32) -> Router<AppState> {
    Router::new()
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/change-password/", post(auth::change_password))
        .layer(auth_rate_limiter(burst))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{CookieSameSite, LogFormat};
    use crate::error::NOT_AUTHENTICATED;

    /// Router over a pool that never connects; only requests rejected before
    /// touching storage can be exercised here.
    fn app() -> axum::Router {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/bazaar"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            cors_origins: Vec::new(),
            catalog_cache_ttl: Duration::from_secs(60),
            session_ttl: Duration::from_secs(3600),
            cookie_same_site: CookieSameSite::Lax,
            auth_rate_limit_burst: NonZeroU32::new(5).unwrap(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            log_format: LogFormat::Text,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bazaar")
            .unwrap();
        Router::new()
            .merge(catalog_routes())
            .merge(cart_routes())
            .merge(account_routes())
            .with_state(AppState::new(config, pool))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_cart_requires_login() {
        let (status, body) = send(get("/cart/")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"detail": NOT_AUTHENTICATED}));

        let checkout = Request::builder()
            .method("POST")
            .uri("/checkout/")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(checkout).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_product_listing_needs_a_source() {
        let (status, body) = send(get("/products/")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("detail").is_some());
    }

    #[tokio::test]
    async fn test_product_listing_rejects_bad_page() {
        let (status, body) = send(get("/products/?subcategory=shirts&page=abc")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Invalid page."}));
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (status, body) = send(get("/products/search/?search=%20")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"search": "Search query is required"}));
    }

    #[tokio::test]
    async fn test_filters_require_subcategory() {
        let (status, body) = send(get("/products/filters/")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("subcategory").is_some());
    }

    #[tokio::test]
    async fn test_wishlist_requires_login() {
        let (status, _) = send(get("/wishlist/")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
