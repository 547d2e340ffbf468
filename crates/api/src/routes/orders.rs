//! Checkout and order history handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::models::Order;
use crate::middleware::RequireAuth;
use crate::services::{CheckoutService, PlacedOrder};
use crate::state::AppState;

/// Optional checkout body.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub note: String,
}

impl CheckoutRequest {
    /// Parse a body that may be empty.
    fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("JSON parse error - {e}")))
    }
}

/// Turn the caller's cart into an order.
///
/// POST /checkout/
#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let request = CheckoutRequest::from_body(&body)?;
    let placed = CheckoutService::new(state.pool())
        .checkout(user.id, &request.note)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// The caller's orders, newest first.
///
/// GET /orders/
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_for_buyer(user.id).await?;
    Ok(Json(orders))
}

/// One of the caller's orders.
///
/// GET /orders/{id}/
pub async fn detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_buyer(user.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_body_may_be_empty() {
        assert_eq!(CheckoutRequest::from_body(b"").unwrap().note, "");
        assert_eq!(CheckoutRequest::from_body(b" \n").unwrap().note, "");
        assert_eq!(CheckoutRequest::from_body(b"{}").unwrap().note, "");
    }

    #[test]
    fn test_checkout_body_note() {
        let request = CheckoutRequest::from_body(br#"{"note": "leave at door"}"#).unwrap();
        assert_eq!(request.note, "leave at door");
    }

    #[test]
    fn test_checkout_body_rejects_garbage() {
        assert!(matches!(
            CheckoutRequest::from_body(b"note=hi"),
            Err(AppError::BadRequest(_))
        ));
    }
}
