//! Public catalog handlers: categories, filters, listings, product pages,
//! reviews and banners.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::validation::require_text;
use bazaar_core::{Email, ValidationErrors};

use crate::db::reviews::NewReview;
use crate::db::{BannerRepository, CatalogRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, QueryParams};
use crate::models::{
    Banner, Category, FilterListing, ProductDetail, ProductPage, Review, SubCategory,
};
use crate::services::catalog::ProductQuery;
use crate::services::{CatalogService, StatisticsRecorder};
use crate::state::AppState;

/// Longest accepted reviewer name.
const MAX_REVIEW_NAME_CHARS: usize = 120;

/// Longest accepted review text.
const MAX_REVIEW_TEXT_CHARS: usize = 1000;

// =============================================================================
// Query / Body Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub home: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub subcategory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Review submission.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    pub rating: Option<i64>,
    #[serde(default)]
    pub text: String,
}

fn catalog(state: &AppState) -> CatalogService<'_> {
    CatalogService::new(state.pool(), state.catalog_cache())
}

// =============================================================================
// Categories
// =============================================================================

/// GET /products/categories/
pub async fn categories(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<HomeQuery>,
) -> Result<Json<Vec<Category>>> {
    let home = query.home.is_some_and(|h| !h.is_empty());
    Ok(Json(catalog(&state).categories(home).await?))
}

/// GET /products/categories/{slug}/
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    catalog(&state)
        .category(&slug)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// GET /products/categories/{slug}/subcategories/
pub async fn subcategories(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<SubCategory>>> {
    Ok(Json(catalog(&state).subcategories(&slug).await?))
}

/// GET /products/subcategories/{slug}/
pub async fn subcategory(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SubCategory>> {
    catalog(&state)
        .subcategory(&slug)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// GET /products/filters/?subcategory=slug
pub async fn filters(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FilterQuery>,
) -> Result<Json<FilterListing>> {
    Ok(Json(catalog(&state).filters(query.subcategory.as_deref()).await?))
}

// =============================================================================
// Products
// =============================================================================

/// GET /products/
pub async fn list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductQuery>,
) -> Result<Json<ProductPage>> {
    Ok(Json(catalog(&state).products(&query).await?))
}

/// Best matching subcategory for a search box query, or `null`.
///
/// GET /products/search/?search=q
pub async fn search(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Json<Option<SubCategory>>> {
    Ok(Json(catalog(&state).search(query.search.as_deref()).await?))
}

/// GET /products/{slug}/
#[instrument(skip(state))]
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    catalog(&state)
        .product(&slug)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

// =============================================================================
// Reviews
// =============================================================================

/// GET /products/{slug}/reviews/
pub async fn reviews(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let Some(product) = CatalogRepository::new(state.pool())
        .product_id_by_slug(&slug)
        .await?
    else {
        return Ok(Json(Vec::new()));
    };
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product)
        .await?;
    Ok(Json(reviews))
}

/// POST /products/{slug}/reviews/create/
#[instrument(skip(state, form))]
pub async fn create_review(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    JsonBody(form): JsonBody<ReviewForm>,
) -> Result<(StatusCode, Json<Review>)> {
    let product = CatalogRepository::new(state.pool())
        .product_id_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut errors = ValidationErrors::new();
    let name = require_text(&mut errors, "name", &form.name, MAX_REVIEW_NAME_CHARS);
    let text = require_text(&mut errors, "text", &form.text, MAX_REVIEW_TEXT_CHARS);
    let email = match form.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        None => None,
        Some(raw) => match Email::parse(raw) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.add("email", "Enter a valid email address.");
                None
            }
        },
    };
    let rating = match form.rating {
        None => {
            errors.add("rating", "This field is required.");
            None
        }
        Some(r) if !(1..=5).contains(&r) => {
            errors.add("rating", "Ensure this value is between 1 and 5.");
            None
        }
        Some(r) => i16::try_from(r).ok(),
    };

    let (Some(name), Some(text), Some(rating)) = (name, text, rating) else {
        return Err(errors.into());
    };
    errors.into_result(())?;

    let review = ReviewRepository::new(state.pool())
        .create(&NewReview {
            product,
            name: &name,
            email: email.as_ref(),
            rating,
            text: &text,
        })
        .await?;

    StatisticsRecorder::new(state.pool()).review_added(product).await;

    Ok((StatusCode::CREATED, Json(review)))
}

// =============================================================================
// Banners
// =============================================================================

/// GET /banners/
pub async fn banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    Ok(Json(BannerRepository::new(state.pool()).list().await?))
}
