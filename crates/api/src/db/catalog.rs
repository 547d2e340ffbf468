//! Catalog repository: categories, subcategories, filters and products.
//!
//! Everything here is read-only. Products are written by the CLI seeder and
//! product counters by [`super::StatisticsRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{
    CategoryId, DescriptionItemId, Discount, FilterTypeId, OptionValueId, ProductId,
    ProductImageId, ProductPropertyId, SubCategoryId,
};

use super::RepositoryError;
use crate::models::{
    Category, DescriptionItem, FilterGroup, FilterListing, OptionValue, ProductCard,
    ProductDetail, ProductImage, ProductPage, ProductProperty, ProductRef, ProductStatistics,
    SubCategory,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    name_ru: String,
    slug: String,
    image: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            name_ru: r.name_ru,
            slug: r.slug,
            image: r.image,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubCategoryRow {
    id: SubCategoryId,
    name: String,
    name_ru: String,
    slug: String,
    category_id: CategoryId,
    category_name: String,
    category_name_ru: String,
    category_slug: String,
    category_image: Option<String>,
}

impl From<SubCategoryRow> for SubCategory {
    fn from(r: SubCategoryRow) -> Self {
        Self {
            id: r.id,
            category: Category {
                id: r.category_id,
                name: r.category_name,
                name_ru: r.category_name_ru,
                slug: r.category_slug,
                image: r.category_image,
            },
            name: r.name,
            name_ru: r.name_ru,
            slug: r.slug,
        }
    }
}

const SUBCATEGORY_SELECT: &str = r"
    SELECT s.id, s.name, s.name_ru, s.slug,
           c.id AS category_id, c.name AS category_name, c.name_ru AS category_name_ru,
           c.slug AS category_slug, c.image AS category_image
    FROM shop.subcategory s
    JOIN shop.category c ON c.id = s.category_id
";

/// Product columns shared by listings and the detail page.
#[derive(sqlx::FromRow)]
struct ProductCardRow {
    id: ProductId,
    name: String,
    name_ru: String,
    slug: String,
    price: Decimal,
    sale: Discount,
    subcategory_id: Option<SubCategoryId>,
    subcategory_name: Option<String>,
    subcategory_name_ru: Option<String>,
    subcategory_slug: Option<String>,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    category_name_ru: Option<String>,
    category_slug: Option<String>,
    category_image: Option<String>,
    image: Option<String>,
    views: i64,
    sold: i64,
    rating: Decimal,
    reviews_count: i32,
}

impl ProductCardRow {
    fn subcategory(&mut self) -> Option<SubCategory> {
        Some(SubCategory {
            id: self.subcategory_id?,
            category: Category {
                id: self.category_id?,
                name: self.category_name.take()?,
                name_ru: self.category_name_ru.take().unwrap_or_default(),
                slug: self.category_slug.take()?,
                image: self.category_image.take(),
            },
            name: self.subcategory_name.take()?,
            name_ru: self.subcategory_name_ru.take().unwrap_or_default(),
            slug: self.subcategory_slug.take()?,
        })
    }

    const fn statistics(&self) -> ProductStatistics {
        ProductStatistics {
            views: self.views,
            sold: self.sold,
            rating: self.rating,
            reviews_count: self.reviews_count,
        }
    }
}

impl From<ProductCardRow> for ProductCard {
    fn from(mut r: ProductCardRow) -> Self {
        let category = r.subcategory();
        let statistics = r.statistics();
        Self {
            id: r.id,
            name: r.name,
            name_ru: r.name_ru,
            slug: r.slug,
            price: r.price,
            sale: r.sale,
            category,
            image: r.image,
            statistics,
        }
    }
}

const PRODUCT_CARD_COLUMNS: &str = r"
    p.id, p.name, p.name_ru, p.slug, p.price, p.sale,
    s.id AS subcategory_id, s.name AS subcategory_name, s.name_ru AS subcategory_name_ru,
    s.slug AS subcategory_slug,
    c.id AS category_id, c.name AS category_name, c.name_ru AS category_name_ru,
    c.slug AS category_slug, c.image AS category_image,
    (SELECT i.image FROM shop.product_image i
     WHERE i.product_id = p.id ORDER BY i.position, i.id LIMIT 1) AS image,
    COALESCE(st.views, 0) AS views,
    COALESCE(st.sold, 0) AS sold,
    COALESCE(st.rating, 0) AS rating,
    COALESCE(st.reviews_count, 0) AS reviews_count
";

const PRODUCT_CARD_JOINS: &str = r"
    FROM shop.product p
    LEFT JOIN shop.subcategory s ON s.id = p.subcategory_id
    LEFT JOIN shop.category c ON c.id = s.category_id
    LEFT JOIN shop.product_statistic st ON st.product_id = p.id
";

#[derive(sqlx::FromRow)]
struct ProductDetailRow {
    #[sqlx(flatten)]
    card: ProductCardRow,
    quantity: i32,
    description_en: String,
    description_ru: String,
    video: Option<String>,
    created_at: DateTime<Utc>,
}

/// Compact product columns, prefixed `product_`, for cart and order queries.
#[derive(sqlx::FromRow)]
pub(crate) struct ProductRefRow {
    product_id: ProductId,
    product_name: String,
    product_name_ru: String,
    product_slug: String,
    product_price: Decimal,
    product_sale: Discount,
    product_image: Option<String>,
}

impl From<ProductRefRow> for ProductRef {
    fn from(r: ProductRefRow) -> Self {
        Self {
            id: r.product_id,
            name: r.product_name,
            name_ru: r.product_name_ru,
            slug: r.product_slug,
            price: r.product_price,
            sale: r.product_sale,
            image: r.product_image,
        }
    }
}

/// Select list for [`ProductRefRow`]; expects the product aliased as `p`.
pub(crate) const PRODUCT_REF_COLUMNS: &str = r"
    p.id AS product_id, p.name AS product_name, p.name_ru AS product_name_ru,
    p.slug AS product_slug, p.price AS product_price, p.sale AS product_sale,
    (SELECT i.image FROM shop.product_image i
     WHERE i.product_id = p.id ORDER BY i.position, i.id LIMIT 1) AS product_image
";

#[derive(sqlx::FromRow)]
struct OptionValueRow {
    id: OptionValueId,
    filter_type_id: FilterTypeId,
    value: String,
    value_ru: String,
}

impl From<OptionValueRow> for OptionValue {
    fn from(r: OptionValueRow) -> Self {
        Self {
            id: r.id,
            filter: r.filter_type_id,
            value: r.value,
            value_ru: r.value_ru,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FilterTypeRow {
    id: FilterTypeId,
    name: String,
    name_ru: String,
}

#[derive(sqlx::FromRow)]
struct PriceBoundsRow {
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: ProductImageId,
    image: String,
}

#[derive(sqlx::FromRow)]
struct PropertyRow {
    id: ProductPropertyId,
    name: String,
    name_ru: String,
    value: String,
    value_ru: String,
}

#[derive(sqlx::FromRow)]
struct DescriptionRow {
    id: DescriptionItemId,
    text: String,
    text_ru: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Narrowing applied to a subcategory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub subcategory: SubCategoryId,
    /// Products must carry every one of these option values.
    pub option_values: Vec<i32>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
}

/// Which products a listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductListing {
    /// All products, best sellers first.
    Trending,
    /// One subcategory, newest first.
    Filtered(ProductFilter),
}

/// Escape `%`, `_` and `\` and wrap in `%` for a substring `ILIKE` match.
#[must_use]
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_listing_conditions(qb: &mut QueryBuilder<'_, Postgres>, listing: &ProductListing) {
    let ProductListing::Filtered(filter) = listing else {
        return;
    };

    qb.push(" WHERE p.subcategory_id = ")
        .push_bind(filter.subcategory);

    if !filter.option_values.is_empty() {
        let mut wanted = filter.option_values.clone();
        wanted.sort_unstable();
        wanted.dedup();
        let wanted_count = i64::try_from(wanted.len()).unwrap_or(i64::MAX);
        qb.push(
            " AND p.id IN (SELECT pov.product_id FROM shop.product_option_value pov \
             WHERE pov.option_value_id = ANY(",
        )
        .push_bind(wanted)
        .push(") GROUP BY pov.product_id HAVING COUNT(DISTINCT pov.option_value_id) = ")
        .push_bind(wanted_count)
        .push(")");
    }
    if let Some(min) = filter.price_min {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.price_max {
        qb.push(" AND p.price <= ").push_bind(max);
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Categories ordered by the total views of their products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.id, c.name, c.name_ru, c.slug, c.image
            FROM shop.category c
            LEFT JOIN shop.subcategory s ON s.category_id = c.id
            LEFT JOIN shop.product p ON p.subcategory_id = s.id
            LEFT JOIN shop.product_statistic st ON st.product_id = p.id
            GROUP BY c.id
            ORDER BY COALESCE(SUM(st.views), 0) DESC, c.id
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, name_ru, slug, image FROM shop.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Subcategories of a category ordered by the total views of their products.
    ///
    /// An unknown category yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_subcategories(
        &self,
        category_slug: &str,
    ) -> Result<Vec<SubCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubCategoryRow>(&format!(
            r"
            {SUBCATEGORY_SELECT}
            LEFT JOIN shop.product p ON p.subcategory_id = s.id
            LEFT JOIN shop.product_statistic st ON st.product_id = p.id
            WHERE c.slug = $1
            GROUP BY s.id, c.id
            ORDER BY COALESCE(SUM(st.views), 0) DESC, s.id
            "
        ))
        .bind(category_slug)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(SubCategory::from).collect())
    }

    /// Get a subcategory by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_subcategory(
        &self,
        slug: &str,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SubCategoryRow>(&format!(
            "{SUBCATEGORY_SELECT} WHERE s.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(SubCategory::from))
    }

    /// The subcategory that best matches a free-text query.
    ///
    /// Scores 10 for an exact name match in either language and 5 for a
    /// substring match; ties go to the subcategory with more matching product
    /// names. Subcategories that only match through product names qualify
    /// with a score of 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn best_subcategory_match(
        &self,
        query: &str,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SubCategoryRow>(&format!(
            r"
            {SUBCATEGORY_SELECT}
            WHERE s.name ILIKE $2 OR s.name_ru ILIKE $2
               OR EXISTS (
                   SELECT 1 FROM shop.product p
                   WHERE p.subcategory_id = s.id AND (p.name ILIKE $2 OR p.name_ru ILIKE $2)
               )
            ORDER BY
                CASE
                    WHEN LOWER(s.name) = LOWER($1) OR LOWER(s.name_ru) = LOWER($1) THEN 10
                    WHEN s.name ILIKE $2 OR s.name_ru ILIKE $2 THEN 5
                    ELSE 0
                END DESC,
                (SELECT COUNT(*) FROM shop.product p
                 WHERE p.subcategory_id = s.id
                   AND (p.name ILIKE $2 OR p.name_ru ILIKE $2)) DESC,
                s.id
            LIMIT 1
            "
        ))
        .bind(query)
        .bind(like_pattern(query))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(SubCategory::from))
    }

    /// The subcategory a product-list search resolves to.
    ///
    /// Only subcategory names count: exact match (either language) beats a
    /// substring match. `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn resolve_search_subcategory(
        &self,
        query: &str,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SubCategoryRow>(&format!(
            r"
            {SUBCATEGORY_SELECT}
            WHERE s.name ILIKE $2 OR s.name_ru ILIKE $2
            ORDER BY
                CASE
                    WHEN LOWER(s.name) = LOWER($1) OR LOWER(s.name_ru) = LOWER($1) THEN 3
                    ELSE 2
                END DESC,
                s.id
            LIMIT 1
            "
        ))
        .bind(query)
        .bind(like_pattern(query))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(SubCategory::from))
    }

    /// Filter types of a subcategory's parent category, with their values,
    /// plus the price range of the subcategory's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn filter_listing(
        &self,
        subcategory: &SubCategory,
    ) -> Result<FilterListing, RepositoryError> {
        let types = sqlx::query_as::<_, FilterTypeRow>(
            "SELECT id, name, name_ru FROM shop.filter_type WHERE category_id = $1 ORDER BY id",
        )
        .bind(subcategory.category.id)
        .fetch_all(self.pool)
        .await?;

        let values = sqlx::query_as::<_, OptionValueRow>(
            r"
            SELECT v.id, v.filter_type_id, v.value, v.value_ru
            FROM shop.option_value v
            JOIN shop.filter_type f ON f.id = v.filter_type_id
            WHERE f.category_id = $1
            ORDER BY v.id
            ",
        )
        .bind(subcategory.category.id)
        .fetch_all(self.pool)
        .await?;

        let bounds = sqlx::query_as::<_, PriceBoundsRow>(
            r"
            SELECT MIN(price) AS min_price, MAX(price) AS max_price
            FROM shop.product
            WHERE subcategory_id = $1
            ",
        )
        .bind(subcategory.id)
        .fetch_one(self.pool)
        .await?;

        let mut by_type: HashMap<FilterTypeId, Vec<OptionValue>> = HashMap::new();
        for value in values {
            by_type
                .entry(value.filter_type_id)
                .or_default()
                .push(value.into());
        }

        let filters = types
            .into_iter()
            .map(|t| FilterGroup {
                values: by_type.remove(&t.id).unwrap_or_default(),
                id: t.id,
                name: t.name,
                name_ru: t.name_ru,
            })
            .collect();

        Ok(FilterListing {
            min_price: bounds.min_price,
            max_price: bounds.max_price,
            filters,
        })
    }

    /// One page of a product listing (pages start at 1).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_products(
        &self,
        listing: &ProductListing,
        page: u32,
    ) -> Result<ProductPage, RepositoryError> {
        let page = page.max(1);

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product p");
        push_listing_conditions(&mut count_query, listing);
        let count = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(PRODUCT_CARD_COLUMNS).push(PRODUCT_CARD_JOINS);
        push_listing_conditions(&mut qb, listing);
        match listing {
            ProductListing::Trending => qb.push(" ORDER BY COALESCE(st.sold, 0) DESC, p.id DESC"),
            ProductListing::Filtered(_) => qb.push(" ORDER BY p.created_at DESC, p.id DESC"),
        };
        let page_size = i64::from(ProductPage::PAGE_SIZE);
        qb.push(" LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind(i64::from(page - 1) * page_size);

        let rows = qb
            .build_query_as::<ProductCardRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(ProductPage::new(
            page,
            count,
            rows.into_iter().map(ProductCard::from).collect(),
        ))
    }

    /// Full product detail by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_product(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductDetailRow>(&format!(
            r"
            SELECT {PRODUCT_CARD_COLUMNS},
                   p.quantity, p.description_en, p.description_ru, p.video, p.created_at
            {PRODUCT_CARD_JOINS}
            WHERE p.slug = $1
            "
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let id = row.card.id;

        let filters = sqlx::query_as::<_, OptionValueRow>(
            r"
            SELECT v.id, v.filter_type_id, v.value, v.value_ru
            FROM shop.product_option_value pov
            JOIN shop.option_value v ON v.id = pov.option_value_id
            WHERE pov.product_id = $1
            ORDER BY v.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let images = sqlx::query_as::<_, ImageRow>(
            "SELECT id, image FROM shop.product_image WHERE product_id = $1 ORDER BY position, id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let properties = sqlx::query_as::<_, PropertyRow>(
            r"
            SELECT id, name, name_ru, value, value_ru
            FROM shop.product_property
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let descriptions = sqlx::query_as::<_, DescriptionRow>(
            r"
            SELECT id, text, text_ru
            FROM shop.product_description_item
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let ProductDetailRow {
            mut card,
            quantity,
            description_en,
            description_ru,
            video,
            created_at,
        } = row;
        let category = card.subcategory();
        let statistics = card.statistics();

        Ok(Some(ProductDetail {
            id: card.id,
            name: card.name,
            name_ru: card.name_ru,
            slug: card.slug,
            price: card.price,
            sale: card.sale,
            quantity,
            description_en,
            description_ru,
            video,
            category,
            filters: filters.into_iter().map(OptionValue::from).collect(),
            images: images
                .into_iter()
                .map(|r| ProductImage {
                    id: r.id,
                    image: r.image,
                })
                .collect(),
            properties: properties
                .into_iter()
                .map(|r| ProductProperty {
                    id: r.id,
                    name: r.name,
                    name_ru: r.name_ru,
                    value: r.value,
                    value_ru: r.value_ru,
                })
                .collect(),
            descriptions: descriptions
                .into_iter()
                .map(|r| DescriptionItem {
                    id: r.id,
                    text: r.text,
                    text_ru: r.text_ru,
                })
                .collect(),
            statistics,
            created_at,
        }))
    }

    /// Resolve a product slug to its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_id_by_slug(&self, slug: &str) -> Result<Option<ProductId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProductId>("SELECT id FROM shop.product WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }

    /// Whether a product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shop.product WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// The subset of `ids` that name existing option values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_option_values(
        &self,
        ids: &[i32],
    ) -> Result<Vec<OptionValueId>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = sqlx::query_scalar::<_, OptionValueId>(
            "SELECT id FROM shop.option_value WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("shoes"), "%shoes%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_filtered_listing_sql() {
        let listing = ProductListing::Filtered(ProductFilter {
            subcategory: SubCategoryId::new(4),
            option_values: vec![7, 3, 7],
            price_min: Some(Decimal::new(1000, 2)),
            price_max: None,
        });
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product p");
        push_listing_conditions(&mut qb, &listing);
        let sql = qb.sql();
        assert!(sql.contains("WHERE p.subcategory_id = $1"));
        assert!(sql.contains("ANY($2)"));
        assert!(sql.contains("COUNT(DISTINCT pov.option_value_id) = $3"));
        assert!(sql.contains("p.price >= $4"));
        assert!(!sql.contains("p.price <="));
    }

    #[test]
    fn test_trending_listing_has_no_conditions() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product p");
        push_listing_conditions(&mut qb, &ProductListing::Trending);
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM shop.product p");
    }
}
