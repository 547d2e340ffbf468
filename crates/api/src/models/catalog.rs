//! Catalog response models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::{
    BannerId, CategoryId, DescriptionItemId, Discount, FilterTypeId, OptionValueId, ProductId,
    ProductImageId, ProductPropertyId, SubCategoryId,
};

/// A top-level catalog category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub name_ru: String,
    pub slug: String,
    pub image: Option<String>,
}

/// A subcategory with its parent category.
#[derive(Debug, Clone, Serialize)]
pub struct SubCategory {
    pub id: SubCategoryId,
    pub category: Category,
    pub name: String,
    pub name_ru: String,
    pub slug: String,
}

/// A selectable/filterable option value, e.g. "Red" of filter type "Color".
#[derive(Debug, Clone, Serialize)]
pub struct OptionValue {
    pub id: OptionValueId,
    pub filter: FilterTypeId,
    pub value: String,
    pub value_ru: String,
}

/// A filter type with all of its values.
#[derive(Debug, Clone, Serialize)]
pub struct FilterGroup {
    pub id: FilterTypeId,
    pub name: String,
    pub name_ru: String,
    pub values: Vec<OptionValue>,
}

/// Filters and price bounds available for a subcategory's listing.
#[derive(Debug, Clone, Serialize)]
pub struct FilterListing {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub filters: Vec<FilterGroup>,
}

/// Product counters maintained by the statistics recorder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductStatistics {
    pub views: i64,
    pub sold: i64,
    pub rating: Decimal,
    pub reviews_count: i32,
}

/// Product as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub name_ru: String,
    pub slug: String,
    pub price: Decimal,
    pub sale: Discount,
    pub category: Option<SubCategory>,
    pub image: Option<String>,
    pub statistics: ProductStatistics,
}

/// Compact product reference embedded in cart and order lines.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub name_ru: String,
    pub slug: String,
    pub price: Decimal,
    pub sale: Discount,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductProperty {
    pub id: ProductPropertyId,
    pub name: String,
    pub name_ru: String,
    pub value: String,
    pub value_ru: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescriptionItem {
    pub id: DescriptionItemId,
    pub text: String,
    pub text_ru: String,
}

/// Full product detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub name_ru: String,
    pub slug: String,
    pub price: Decimal,
    pub sale: Discount,
    pub quantity: i32,
    pub description_en: String,
    pub description_ru: String,
    pub video: Option<String>,
    pub category: Option<SubCategory>,
    pub filters: Vec<OptionValue>,
    pub images: Vec<ProductImage>,
    pub properties: Vec<ProductProperty>,
    pub descriptions: Vec<DescriptionItem>,
    pub statistics: ProductStatistics,
    pub created_at: DateTime<Utc>,
}

/// One page of a product listing.
///
/// `next` and `previous` are page numbers, `None` at either end.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<ProductCard>,
}

impl ProductPage {
    /// Products per listing page.
    pub const PAGE_SIZE: u32 = 48;

    /// Assemble a page, deriving neighbours from the total count.
    #[must_use]
    pub fn new(page: u32, count: i64, results: Vec<ProductCard>) -> Self {
        let shown = i64::from(page) * i64::from(Self::PAGE_SIZE);
        Self {
            count,
            next: (shown < count).then(|| page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        }
    }

    /// An empty first page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// Promotional banner.
#[derive(Debug, Clone, Serialize)]
pub struct Banner {
    pub id: BannerId,
    pub image: String,
    pub alt: String,
}
