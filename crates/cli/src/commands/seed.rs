//! Seed the catalog from a YAML file.
//!
//! The file describes categories with their filters, subcategories and
//! products, plus homepage banners:
//!
//! ```yaml
//! categories:
//!   - name: Clothing
//!     name_ru: Одежда
//!     image: categories/clothing.jpg
//!     filters:
//!       - name: Size
//!         name_ru: Размер
//!         values:
//!           - { value: M }
//!           - { value: L }
//!     subcategories:
//!       - name: Shirts
//!         products:
//!           - name: Linen Shirt
//!             price: "49.90"
//!             quantity: 12
//!             sale: 10
//!             images: [products/linen-shirt.jpg]
//!             options: { Size: M }
//! banners:
//!   - { image: banners/summer.jpg, alt: Summer sale }
//! ```
//!
//! Slugs are derived from English names and suffixed (`-2`, `-3`, ...) when
//! already taken. Everything is inserted in one transaction.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info};

use bazaar_api::routes::RESERVED_PRODUCT_SLUGS;
use bazaar_core::slug::unique_slug;

// =============================================================================
// File format
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub banners: Vec<BannerSeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub name_ru: String,
    pub image: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterSeed>,
    #[serde(default)]
    pub subcategories: Vec<SubCategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct FilterSeed {
    pub name: String,
    #[serde(default)]
    pub name_ru: String,
    #[serde(default)]
    pub values: Vec<OptionValueSeed>,
}

#[derive(Debug, Deserialize)]
pub struct OptionValueSeed {
    pub value: String,
    #[serde(default)]
    pub value_ru: String,
}

#[derive(Debug, Deserialize)]
pub struct SubCategorySeed {
    pub name: String,
    #[serde(default)]
    pub name_ru: String,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub name_ru: String,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub sale: u8,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub description_ru: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Filter name to option value, e.g. `{ Size: M }`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct BannerSeed {
    pub image: String,
    #[serde(default)]
    pub alt: String,
}

/// Rows inserted by a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub subcategories: usize,
    pub option_values: usize,
    pub products: usize,
    pub banners: usize,
}

/// Check a parsed catalog for problems the database would reject or that
/// would silently produce a wrong catalog.
///
/// Returns one message per problem; an empty list means the file is valid.
pub fn validate_catalog(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    for category in &seed.categories {
        if category.name.trim().is_empty() {
            errors.push("category with an empty name".to_owned());
        }

        let mut known: HashMap<&str, HashSet<&str>> = HashMap::new();
        for filter in &category.filters {
            let values = known.entry(filter.name.as_str()).or_default();
            for value in &filter.values {
                if !values.insert(value.value.as_str()) {
                    errors.push(format!(
                        "{}: duplicate value {:?} in filter {:?}",
                        category.name, value.value, filter.name
                    ));
                }
            }
        }

        for subcategory in &category.subcategories {
            if subcategory.name.trim().is_empty() {
                errors.push(format!("{}: subcategory with an empty name", category.name));
            }
            for product in &subcategory.products {
                let label = format!("{} / {}", subcategory.name, product.name);
                if product.name.trim().is_empty() {
                    errors.push(format!("{label}: product with an empty name"));
                }
                if product.price.is_sign_negative() {
                    errors.push(format!("{label}: price must not be negative"));
                }
                if product.sale > 100 {
                    errors.push(format!("{label}: sale must be between 0 and 100"));
                }
                for (filter, value) in &product.options {
                    let exists = known
                        .get(filter.as_str())
                        .is_some_and(|values| values.contains(value.as_str()));
                    if !exists {
                        errors.push(format!(
                            "{label}: unknown option {filter}={value} for category {}",
                            category.name
                        ));
                    }
                }
            }
        }
    }

    for banner in &seed.banners {
        if banner.image.trim().is_empty() {
            errors.push("banner with an empty image".to_owned());
        }
    }

    errors
}

// =============================================================================
// Command
// =============================================================================

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid, or if a
/// database operation fails. Nothing is inserted on failure.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let summary = insert_catalog(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Subcategories: {}", summary.subcategories);
    info!("  Option values: {}", summary.option_values);
    info!("  Products: {}", summary.products);
    info!("  Banners: {}", summary.banners);
    Ok(())
}

/// Slugs already used by one table, updated as rows are inserted.
struct SlugRegistry {
    taken: HashSet<String>,
}

impl SlugRegistry {
    async fn load(conn: &mut PgConnection, table: &str) -> Result<Self, sqlx::Error> {
        let taken = sqlx::query_scalar::<_, String>(&format!("SELECT slug FROM shop.{table}"))
            .fetch_all(conn)
            .await?
            .into_iter()
            .collect();
        Ok(Self { taken })
    }

    #[must_use]
    fn reserving(mut self, slugs: &[&str]) -> Self {
        self.taken.extend(slugs.iter().map(|s| (*s).to_owned()));
        self
    }

    fn claim(&mut self, name: &str) -> String {
        let slug = unique_slug(name, |candidate| self.taken.contains(candidate));
        self.taken.insert(slug.clone());
        slug
    }
}

async fn insert_catalog(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedSummary, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    let mut category_slugs = SlugRegistry::load(&mut tx, "category").await?;
    let mut subcategory_slugs = SlugRegistry::load(&mut tx, "subcategory").await?;
    let mut product_slugs = SlugRegistry::load(&mut tx, "product")
        .await?
        .reserving(&RESERVED_PRODUCT_SLUGS);

    for category in &seed.categories {
        let category_id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO shop.category (name, name_ru, slug, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&category.name)
        .bind(&category.name_ru)
        .bind(category_slugs.claim(&category.name))
        .bind(&category.image)
        .fetch_one(&mut *tx)
        .await?;
        summary.categories += 1;

        // (filter name, value) -> option value id
        let mut option_ids: HashMap<(&str, &str), i32> = HashMap::new();
        for filter in &category.filters {
            let filter_id = sqlx::query_scalar::<_, i32>(
                r"
                INSERT INTO shop.filter_type (category_id, name, name_ru)
                VALUES ($1, $2, $3)
                RETURNING id
                ",
            )
            .bind(category_id)
            .bind(&filter.name)
            .bind(&filter.name_ru)
            .fetch_one(&mut *tx)
            .await?;

            for value in &filter.values {
                let value_id = sqlx::query_scalar::<_, i32>(
                    r"
                    INSERT INTO shop.option_value (filter_type_id, value, value_ru)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    ",
                )
                .bind(filter_id)
                .bind(&value.value)
                .bind(&value.value_ru)
                .fetch_one(&mut *tx)
                .await?;
                option_ids.insert((filter.name.as_str(), value.value.as_str()), value_id);
                summary.option_values += 1;
            }
        }

        for subcategory in &category.subcategories {
            let subcategory_id = sqlx::query_scalar::<_, i32>(
                r"
                INSERT INTO shop.subcategory (category_id, name, name_ru, slug)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                ",
            )
            .bind(category_id)
            .bind(&subcategory.name)
            .bind(&subcategory.name_ru)
            .bind(subcategory_slugs.claim(&subcategory.name))
            .fetch_one(&mut *tx)
            .await?;
            summary.subcategories += 1;

            for product in &subcategory.products {
                let options: Vec<i32> = product
                    .options
                    .iter()
                    .filter_map(|(filter, value)| {
                        option_ids.get(&(filter.as_str(), value.as_str())).copied()
                    })
                    .collect();
                insert_product(
                    &mut tx,
                    subcategory_id,
                    product,
                    &product_slugs.claim(&product.name),
                    &options,
                )
                .await?;
                summary.products += 1;
            }
        }
    }

    for banner in &seed.banners {
        sqlx::query("INSERT INTO shop.banner (image, alt) VALUES ($1, $2)")
            .bind(&banner.image)
            .bind(&banner.alt)
            .execute(&mut *tx)
            .await?;
        summary.banners += 1;
    }

    tx.commit().await?;
    Ok(summary)
}

async fn insert_product(
    conn: &mut PgConnection,
    subcategory_id: i32,
    product: &ProductSeed,
    slug: &str,
    options: &[i32],
) -> Result<(), sqlx::Error> {
    let quantity = i32::try_from(product.quantity).unwrap_or(i32::MAX);

    let product_id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO shop.product
            (subcategory_id, name, name_ru, slug, price, quantity, description_en, description_ru, sale)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        ",
    )
    .bind(subcategory_id)
    .bind(&product.name)
    .bind(&product.name_ru)
    .bind(slug)
    .bind(product.price)
    .bind(quantity)
    .bind(&product.description_en)
    .bind(&product.description_ru)
    .bind(i16::from(product.sale))
    .fetch_one(&mut *conn)
    .await?;

    if !options.is_empty() {
        sqlx::query(
            r"
            INSERT INTO shop.product_option_value (product_id, option_value_id)
            SELECT $1, UNNEST($2::int4[])
            ",
        )
        .bind(product_id)
        .bind(options)
        .execute(&mut *conn)
        .await?;
    }

    for (position, image) in product.images.iter().enumerate() {
        sqlx::query("INSERT INTO shop.product_image (product_id, image, position) VALUES ($1, $2, $3)")
            .bind(product_id)
            .bind(image)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query("INSERT INTO shop.product_statistic (product_id) VALUES ($1)")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Clothing
    name_ru: Одежда
    filters:
      - name: Size
        values:
          - { value: M }
          - { value: L }
    subcategories:
      - name: Shirts
        products:
          - name: Linen Shirt
            price: "49.90"
            quantity: 12
            sale: 10
            options: { Size: M }
          - name: Plain Tee
            price: 15
banners:
  - { image: banners/summer.jpg, alt: Summer sale }
"#;

    #[test]
    fn test_parse_sample() {
        let seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(seed.categories.len(), 1);
        assert_eq!(seed.banners.len(), 1);

        let products = &seed.categories[0].subcategories[0].products;
        assert_eq!(products[0].price, Decimal::new(4990, 2));
        assert_eq!(products[0].options.get("Size").map(String::as_str), Some("M"));
        assert_eq!(products[1].price, Decimal::from(15));
        assert_eq!(products[1].sale, 0);
        assert!(validate_catalog(&seed).is_empty());
    }

    #[test]
    fn test_unknown_option_is_reported() {
        let mut seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        seed.categories[0].subcategories[0].products[0]
            .options
            .insert("Color".to_owned(), "Red".to_owned());

        let errors = validate_catalog(&seed);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Color=Red"));
    }

    #[test]
    fn test_bad_price_and_sale_are_reported() {
        let mut seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        let product = &mut seed.categories[0].subcategories[0].products[1];
        product.price = Decimal::new(-1, 0);
        product.sale = 150;

        assert_eq!(validate_catalog(&seed).len(), 2);
    }

    #[test]
    fn test_slug_registry_suffixes_taken_slugs() {
        let mut registry = SlugRegistry {
            taken: HashSet::from(["linen-shirt".to_owned()]),
        };
        assert_eq!(registry.claim("Linen Shirt"), "linen-shirt-2");
        assert_eq!(registry.claim("Linen Shirt"), "linen-shirt-3");
        assert_eq!(registry.claim("Plain Tee"), "plain-tee");
    }

    #[test]
    fn test_product_slugs_avoid_catalog_routes() {
        let mut registry = SlugRegistry {
            taken: HashSet::new(),
        }
        .reserving(&RESERVED_PRODUCT_SLUGS);
        assert_eq!(registry.claim("Search"), "search-2");
        assert_eq!(registry.claim("Filters"), "filters-2");
        assert_eq!(registry.claim("Categories"), "categories-2");
        assert_eq!(registry.claim("Subcategories"), "subcategories-2");
        assert_eq!(registry.claim("Search Light"), "search-light");
    }
}
