//! Catalog browsing: categories, filters, listings, search and product pages.
//!
//! Category trees and filter listings change rarely and are served from a
//! short-lived `moka` cache held in the application state.

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::ValidationErrors;

use super::statistics::StatisticsRecorder;
use crate::db::catalog::{ProductFilter, ProductListing};
use crate::db::{CatalogRepository, RepositoryError};
use crate::models::{Category, FilterListing, ProductDetail, ProductPage, SubCategory};

/// Categories shown on the home page.
pub const HOME_CATEGORY_LIMIT: i64 = 10;

/// Cached catalog data.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Subcategories(Vec<SubCategory>),
    Filters(FilterListing),
}

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Query parameters failed validation.
    #[error("invalid catalog query: {0}")]
    Invalid(#[from] ValidationErrors),

    /// Page number out of range or not a number.
    #[error("invalid page")]
    InvalidPage,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Query string of the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub home: Option<String>,
    pub subcategory: Option<String>,
    pub search: Option<String>,
    pub filters: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub page: Option<String>,
}

/// Whether a `home` flag is switched on.
#[must_use]
pub fn is_home(flag: Option<&str>) -> bool {
    matches!(flag, Some("1" | "true" | "True"))
}

/// Catalog operations for one request.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
    repo: CatalogRepository<'a>,
    cache: &'a Cache<String, CacheValue>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a Cache<String, CacheValue>) -> Self {
        Self {
            pool,
            repo: CatalogRepository::new(pool),
            cache,
        }
    }

    /// Categories by popularity; the home page gets the top ten.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn categories(&self, home: bool) -> Result<Vec<Category>, CatalogError> {
        let cache_key = format!("categories:{home}");
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&cache_key).await {
            return Ok(categories);
        }

        let categories = self
            .repo
            .list_categories(home.then_some(HOME_CATEGORY_LIMIT))
            .await?;
        self.cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn category(&self, slug: &str) -> Result<Option<Category>, CatalogError> {
        Ok(self.repo.get_category(slug).await?)
    }

    /// Subcategories of a category by popularity. Unknown slugs give an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn subcategories(&self, category_slug: &str) -> Result<Vec<SubCategory>, CatalogError> {
        let cache_key = format!("subcategories:{category_slug}");
        if let Some(CacheValue::Subcategories(subcategories)) = self.cache.get(&cache_key).await {
            return Ok(subcategories);
        }

        let subcategories = self.repo.list_subcategories(category_slug).await?;
        self.cache
            .insert(cache_key, CacheValue::Subcategories(subcategories.clone()))
            .await;
        Ok(subcategories)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn subcategory(&self, slug: &str) -> Result<Option<SubCategory>, CatalogError> {
        Ok(self.repo.get_subcategory(slug).await?)
    }

    /// Filters and price range for a subcategory's listing page.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` keyed `subcategory` if the slug is
    /// missing or unknown.
    pub async fn filters(&self, subcategory_slug: Option<&str>) -> Result<FilterListing, CatalogError> {
        let Some(slug) = subcategory_slug.filter(|s| !s.is_empty()) else {
            return Err(ValidationErrors::single(
                "subcategory",
                "This query param is required (subcategory=<slug>)",
            )
            .into());
        };

        let cache_key = format!("filters:{slug}");
        if let Some(CacheValue::Filters(listing)) = self.cache.get(&cache_key).await {
            return Ok(listing);
        }

        let subcategory = self
            .repo
            .get_subcategory(slug)
            .await?
            .ok_or_else(invalid_subcategory)?;
        let listing = self.repo.filter_listing(&subcategory).await?;
        self.cache
            .insert(cache_key, CacheValue::Filters(listing.clone()))
            .await;
        Ok(listing)
    }

    /// One page of products.
    ///
    /// `home` lists best sellers. Otherwise either `search` (resolved to its
    /// closest subcategory) or `subcategory` picks the listing, narrowed by
    /// option values (all must match) and a price range.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` for a missing target, an unknown
    /// subcategory or a malformed price, and `CatalogError::InvalidPage` for
    /// a page past the end.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let page = parse_page(query.page.as_deref())?;

        let listing = if is_home(query.home.as_deref()) {
            ProductListing::Trending
        } else {
            let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
            let slug = query.subcategory.as_deref().filter(|s| !s.is_empty());

            let subcategory = match (search, slug) {
                (Some(search), _) => match self.repo.resolve_search_subcategory(search).await? {
                    Some(subcategory) => subcategory,
                    None => return Ok(ProductPage::empty()),
                },
                (None, Some(slug)) => self
                    .repo
                    .get_subcategory(slug)
                    .await?
                    .ok_or_else(invalid_subcategory)?,
                (None, None) => {
                    return Err(ValidationErrors::single(
                        "detail",
                        "Either 'subcategory' or 'search' query param is required",
                    )
                    .into());
                }
            };

            let mut errors = ValidationErrors::new();
            let price_min = parse_price(&mut errors, "price_min", query.price_min.as_deref());
            let price_max = parse_price(&mut errors, "price_max", query.price_max.as_deref());
            errors.into_result(())?;

            ProductListing::Filtered(ProductFilter {
                subcategory: subcategory.id,
                option_values: parse_option_ids(query.filters.as_deref()),
                price_min,
                price_max,
            })
        };

        let result = self.repo.list_products(&listing, page).await?;
        if page > 1 && result.results.is_empty() {
            return Err(CatalogError::InvalidPage);
        }
        Ok(result)
    }

    /// The subcategory a free-text query most likely refers to.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` keyed `search` if the query is blank.
    pub async fn search(&self, query: Option<&str>) -> Result<Option<SubCategory>, CatalogError> {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return Err(ValidationErrors::single("search", "Search query is required").into());
        };
        Ok(self.repo.best_subcategory_match(query).await?)
    }

    /// A product page. Counts a view when the product exists.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if a query fails.
    pub async fn product(&self, slug: &str) -> Result<Option<ProductDetail>, CatalogError> {
        let product = self.repo.get_product(slug).await?;
        if let Some(product) = &product {
            StatisticsRecorder::new(self.pool).product_viewed(product.id).await;
        }
        Ok(product)
    }
}

fn invalid_subcategory() -> CatalogError {
    ValidationErrors::single("subcategory", "Invalid subcategory slug").into()
}

/// Parse `page`, defaulting to the first page.
fn parse_page(raw: Option<&str>) -> Result<u32, CatalogError> {
    match raw {
        None | Some("") => Ok(1),
        Some(raw) => match raw.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(CatalogError::InvalidPage),
        },
    }
}

/// Option value ids from a comma-separated list; non-numeric entries are
/// skipped.
fn parse_option_ids(raw: Option<&str>) -> Vec<i32> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|s| s.parse::<i32>().ok())
            .collect()
    })
    .unwrap_or_default()
}

fn parse_price(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Option<Decimal> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<Decimal>() {
        Ok(price) => Some(price),
        Err(_) => {
            errors.add(field, "A valid number is required.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_home() {
        assert!(is_home(Some("1")));
        assert!(is_home(Some("true")));
        assert!(is_home(Some("True")));
        assert!(!is_home(Some("0")));
        assert!(!is_home(Some("yes")));
        assert!(!is_home(None));
    }

    #[test]
    fn test_parse_option_ids_skips_junk() {
        assert_eq!(parse_option_ids(Some("1,2, 3")), vec![1, 2, 3]);
        assert_eq!(parse_option_ids(Some("4,x,-5,,6")), vec![4, 6]);
        assert!(parse_option_ids(None).is_empty());
    }

    #[test]
    fn test_parse_page() {
        assert!(matches!(parse_page(None), Ok(1)));
        assert!(matches!(parse_page(Some("3")), Ok(3)));
        assert!(matches!(parse_page(Some("0")), Err(CatalogError::InvalidPage)));
        assert!(matches!(parse_page(Some("two")), Err(CatalogError::InvalidPage)));
    }

    #[test]
    fn test_parse_price() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            parse_price(&mut errors, "price_min", Some("19.90")),
            Some(Decimal::new(1990, 2))
        );
        assert_eq!(parse_price(&mut errors, "price_min", None), None);
        assert!(errors.is_empty());

        assert_eq!(parse_price(&mut errors, "price_max", Some("cheap")), None);
        assert_eq!(errors.get("price_max"), Some("A valid number is required."));
    }
}
