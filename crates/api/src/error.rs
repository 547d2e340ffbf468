//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as JSON bodies:
//! validation failures as a field-keyed object, everything else as
//! `{"detail": "..."}`. Server-side failures are captured to Sentry and
//! logged before responding, and their details never reach the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use bazaar_core::ValidationErrors;
use bazaar_core::checkout::CheckoutError;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CatalogError, CheckoutFailure};

/// Body of a 401 for requests without a logged-in user.
pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";

/// Body of a 401 for a failed login.
pub const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout did not produce an order.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutFailure),

    /// Catalog query failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Request fields failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found, or not owned by the caller.
    #[error("Not found")]
    NotFound,

    /// User is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An extractor refused the request, with the status it chose.
    #[error("Rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How an error is shown to the client.
enum Body {
    Detail(String),
    Fields(ValidationErrors),
}

impl AppError {
    /// Whether this error is a server-side failure.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Session(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
                | Self::Cart(CartError::Repository(_))
                | Self::Checkout(CheckoutError::Ledger(_) | CheckoutError::CartChanged { .. })
                | Self::Catalog(CatalogError::Repository(_))
        )
    }

    fn status_and_body(self) -> (StatusCode, Body) {
        let detail = |status: StatusCode, message: &str| (status, Body::Detail(message.to_owned()));
        let not_found = || detail(StatusCode::NOT_FOUND, "Not found.");
        let internal = || detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");

        match self {
            Self::Validation(errors)
            | Self::Auth(AuthError::Invalid(errors))
            | Self::Cart(CartError::Invalid(errors))
            | Self::Catalog(CatalogError::Invalid(errors)) => {
                (StatusCode::BAD_REQUEST, Body::Fields(errors))
            }
            Self::Auth(AuthError::InvalidCredentials) => {
                detail(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
            }
            Self::Unauthorized | Self::Auth(AuthError::UserNotFound) => {
                detail(StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED)
            }
            Self::Checkout(CheckoutError::EmptyCart) => {
                detail(StatusCode::BAD_REQUEST, "Cart is empty")
            }
            Self::Checkout(CheckoutError::CartChanged { .. }) => detail(
                StatusCode::CONFLICT,
                "Cart changed during checkout, please try again",
            ),
            Self::Catalog(CatalogError::InvalidPage) => {
                detail(StatusCode::NOT_FOUND, "Invalid page.")
            }
            Self::NotFound | Self::Cart(CartError::NotFound) => not_found(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, Body::Detail(message)),
            Self::Rejected { status, message } => (status, Body::Detail(message)),
            Self::Database(_)
            | Self::Session(_)
            | Self::Internal(_)
            | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
            | Self::Cart(CartError::Repository(_))
            | Self::Checkout(CheckoutError::Ledger(_))
            | Self::Catalog(CatalogError::Repository(_)) => internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = self.status_and_body();
        let body = match body {
            Body::Detail(message) => json!({ "detail": message }),
            Body::Fields(errors) => json!(errors),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_is_field_keyed() {
        let err = AppError::from(ValidationErrors::single(
            "quantity",
            "Ensure this value is greater than or equal to 1.",
        ));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"quantity": "Ensure this value is greater than or equal to 1."})
        );
    }

    #[tokio::test]
    async fn test_not_found_shape() {
        let (status, body) = render(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not found."}));

        let (status, _) = render(CartError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_cart_is_bad_request() {
        let (status, body) = render(AppError::Checkout(CheckoutError::EmptyCart)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Cart is empty"}));
    }

    #[tokio::test]
    async fn test_auth_errors() {
        let (status, body) = render(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"detail": NOT_AUTHENTICATED}));

        let (status, body) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"detail": INVALID_CREDENTIALS}));
    }

    #[tokio::test]
    async fn test_storage_errors_are_opaque() {
        let err = AppError::Checkout(CheckoutError::Ledger(RepositoryError::DataCorruption(
            "negative cart_line.quantity: -1".to_string(),
        )));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_invalid_page() {
        let (status, body) = render(CatalogError::InvalidPage.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Invalid page."}));
    }

    #[tokio::test]
    async fn test_json_rejection_keeps_status() {
        use axum::extract::{FromRequest, Request};

        let request = Request::builder()
            .method("POST")
            .uri("/cart/add/")
            .body(axum::body::Body::from(r#"{"product": 1}"#))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();
        let (status, body) = render(rejection.into()).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body.get("detail").is_some());

        let request = Request::builder()
            .method("POST")
            .uri("/cart/add/")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();
        let (status, _) = render(rejection.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
        assert_eq!(AppError::NotFound.to_string(), "Not found");
    }
}
