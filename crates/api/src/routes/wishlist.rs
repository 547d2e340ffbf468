//! Wishlist handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use bazaar_core::{ProductId, ValidationErrors};

use crate::db::{CatalogRepository, WishlistRepository};
use crate::error::Result;
use crate::extract::JsonBody;
use crate::middleware::RequireAuth;
use crate::models::WishlistItem;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product: ProductId,
}

/// GET /wishlist/
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<WishlistItem>>> {
    Ok(Json(WishlistRepository::new(state.pool()).list(user.id).await?))
}

/// Save a product; saving it again returns the existing item with 200.
///
/// POST /wishlist/add/
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(request): JsonBody<AddRequest>,
) -> Result<(StatusCode, Json<WishlistItem>)> {
    if !CatalogRepository::new(state.pool())
        .product_exists(request.product)
        .await?
    {
        return Err(ValidationErrors::single(
            "product",
            format!("Invalid pk \"{}\" - object does not exist.", request.product),
        )
        .into());
    }

    let (item, created) = WishlistRepository::new(state.pool())
        .add(user.id, request.product)
        .await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(item)))
}

/// DELETE /wishlist/{product_id}/remove/
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product): Path<ProductId>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .remove(user.id, product)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
