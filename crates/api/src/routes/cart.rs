//! Cart route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use bazaar_core::CartLineId;

use crate::error::{Result, add_breadcrumb};
use crate::extract::JsonBody;
use crate::middleware::RequireAuth;
use crate::models::CartLine;
use crate::services::CartService;
use crate::services::cart::{AddLine, AddOutcome, UpdateLine, UpdateOutcome};
use crate::state::AppState;

/// List the caller's cart.
///
/// GET /cart/
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartLine>>> {
    let lines = CartService::new(state.pool()).list(user.id).await?;
    Ok(Json(lines))
}

/// Add a product to the cart, merging with an identical line.
///
/// POST /cart/add/
///
/// Returns 201 for a new line and 200 when an existing line grew.
#[instrument(skip(state, request), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(request): JsonBody<AddLine>,
) -> Result<Response> {
    let outcome = CartService::new(state.pool()).add(user.id, &request).await?;
    let (status, line) = match outcome {
        AddOutcome::Created(line) => (StatusCode::CREATED, line),
        AddOutcome::Merged(line) => (StatusCode::OK, line),
    };

    let product_id = line.product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

    Ok((status, Json(line)).into_response())
}

/// Change a line's quantity; zero or less deletes it.
///
/// PATCH /cart/{id}/
#[instrument(skip(state, request), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(line): Path<CartLineId>,
    JsonBody(request): JsonBody<UpdateLine>,
) -> Result<Response> {
    let quantity = request.quantity()?;
    let outcome = CartService::new(state.pool())
        .update(user.id, line, quantity)
        .await?;

    Ok(match outcome {
        UpdateOutcome::Updated(line) => Json(line).into_response(),
        UpdateOutcome::Deleted => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Remove a line. Succeeds when the line is already gone.
///
/// DELETE /cart/{id}/remove/
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(line): Path<CartLineId>,
) -> Result<StatusCode> {
    CartService::new(state.pool()).remove(user.id, line).await?;
    Ok(StatusCode::NO_CONTENT)
}
