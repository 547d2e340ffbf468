//! Cart store.
//!
//! Every mutation runs in its own transaction that starts by taking the
//! buyer's cart lock, so cart writes and checkout for one user happen one at
//! a time.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{CartLineId, OptionSignature, OptionValueId, ProductId, UserId, ValidationErrors};

use crate::db::{CartRepository, CatalogRepository, RepositoryError};
use crate::models::CartLine;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

const REQUIRED: &str = "This field is required.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Request fields failed validation.
    #[error("invalid cart request: {0}")]
    Invalid(#[from] ValidationErrors),

    /// No such line in the caller's cart.
    #[error("cart line not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Add-to-cart request.
///
/// `product` and `quantity` are kept as raw JSON so that a missing or
/// mistyped value is reported against its field instead of failing the
/// whole body.
#[derive(Debug, Default, Deserialize)]
pub struct AddLine {
    #[serde(default)]
    pub product: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default, alias = "filter_values")]
    pub option_values: Vec<i32>,
}

impl AddLine {
    #[must_use]
    pub fn new(product: ProductId, quantity: i64, option_values: Vec<i32>) -> Self {
        Self {
            product: Some(product.as_i32().into()),
            quantity: Some(quantity.into()),
            option_values,
        }
    }

    /// The product and a quantity in `1..=MAX_LINE_QUANTITY`, defaulting to 1.
    ///
    /// # Errors
    ///
    /// Returns field-keyed messages for `product` and `quantity`.
    pub fn validate(&self) -> Result<(ProductId, u32), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let product = match self.product.as_ref() {
            None => {
                errors.add("product", REQUIRED);
                None
            }
            Some(value) => match integer(value).map(i32::try_from) {
                Some(Ok(id)) => Some(ProductId::new(id)),
                Some(Err(_)) => {
                    errors.add("product", format!("Invalid pk \"{value}\" - object does not exist."));
                    None
                }
                None => {
                    errors.add(
                        "product",
                        format!("Incorrect type. Expected pk value, received {}.", type_name(value)),
                    );
                    None
                }
            },
        };

        let quantity = match self.quantity.as_ref().map(integer) {
            None => positive_quantity(1),
            Some(Some(quantity)) => positive_quantity(quantity),
            Some(None) => Err(ValidationErrors::single("quantity", NOT_AN_INTEGER)),
        };
        let quantity = match quantity {
            Ok(quantity) => Some(quantity),
            Err(invalid) => {
                for (field, message) in invalid.iter() {
                    errors.add(field, message);
                }
                None
            }
        };

        match (product, quantity) {
            (Some(product), Some(quantity)) => Ok((product, quantity)),
            _ => Err(errors),
        }
    }
}

/// Quantity change request.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLine {
    #[serde(default)]
    pub quantity: Option<Value>,
}

impl UpdateLine {
    /// The requested quantity, which may be zero or negative.
    ///
    /// # Errors
    ///
    /// Returns a message keyed `quantity` when it is absent or not an integer.
    pub fn quantity(&self) -> Result<i64, ValidationErrors> {
        match &self.quantity {
            None => Err(ValidationErrors::single("quantity", REQUIRED)),
            Some(value) => {
                integer(value).ok_or_else(|| ValidationErrors::single("quantity", NOT_AN_INTEGER))
            }
        }
    }
}

/// What an add did to the cart.
#[derive(Debug)]
pub enum AddOutcome {
    /// A new line was created.
    Created(CartLine),
    /// An identical line existed and its quantity was increased.
    Merged(CartLine),
}

/// What an update did to the cart.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(CartLine),
    /// Quantity was zero or negative, so the line is gone.
    Deleted,
}

/// Cart operations for one request.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All of the user's lines with current totals.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the lines cannot be read.
    pub async fn list(&self, user: UserId) -> Result<Vec<CartLine>, CartError> {
        Ok(CartRepository::new(self.pool).list_for_user(user).await?)
    }

    /// Add a product with a set of option values.
    ///
    /// An existing line with the same product and the same option set is
    /// incremented instead of creating a duplicate.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Invalid` keyed `quantity`, `product` or
    /// `option_values`.
    #[instrument(skip(self, request))]
    pub async fn add(&self, user: UserId, request: &AddLine) -> Result<AddOutcome, CartError> {
        let (product, quantity) = request.validate()?;
        let options = self.resolve_options(product, &request.option_values).await?;

        let mut tx = self.pool.begin().await?;
        CartRepository::lock_user(&mut tx, user).await?;

        let existing = CartRepository::find_matching(&mut tx, user, product, &options).await?;
        let (line_id, merged) = if let Some(existing) = existing {
            let total = existing.quantity.saturating_add(quantity);
            if total > MAX_LINE_QUANTITY {
                return Err(quantity_too_large().into());
            }
            CartRepository::set_quantity(&mut tx, user, existing.id, total).await?;
            (existing.id, true)
        } else {
            let id = CartRepository::insert_line(&mut tx, user, product, quantity, &options)
                .await?;
            (id, false)
        };

        let line = CartRepository::get_line(&mut tx, user, line_id)
            .await?
            .ok_or(CartError::NotFound)?;
        tx.commit().await?;

        tracing::debug!(
            line_id = %line_id,
            product = %product,
            merged,
            quantity = line.quantity,
            "Cart line saved"
        );
        Ok(if merged {
            AddOutcome::Merged(line)
        } else {
            AddOutcome::Created(line)
        })
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if a positive quantity targets a line the
    /// user does not own.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        user: UserId,
        line: CartLineId,
        quantity: i64,
    ) -> Result<UpdateOutcome, CartError> {
        let mut tx = self.pool.begin().await?;
        CartRepository::lock_user(&mut tx, user).await?;

        if quantity <= 0 {
            CartRepository::delete_line(&mut tx, user, line).await?;
            tx.commit().await?;
            return Ok(UpdateOutcome::Deleted);
        }

        let quantity = positive_quantity(quantity)?;
        if !CartRepository::set_quantity(&mut tx, user, line, quantity).await? {
            return Err(CartError::NotFound);
        }
        let updated = CartRepository::get_line(&mut tx, user, line)
            .await?
            .ok_or(CartError::NotFound)?;
        tx.commit().await?;

        Ok(UpdateOutcome::Updated(updated))
    }

    /// Remove a line. Removing a missing line succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, line: CartLineId) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await?;
        CartRepository::lock_user(&mut tx, user).await?;
        CartRepository::delete_line(&mut tx, user, line).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Check that the product and every option value exist and build the
    /// line's option signature.
    async fn resolve_options(
        &self,
        product: ProductId,
        option_values: &[i32],
    ) -> Result<OptionSignature, CartError> {
        let catalog = CatalogRepository::new(self.pool);
        let mut errors = ValidationErrors::new();

        if !catalog.product_exists(product).await? {
            errors.add(
                "product",
                format!("Invalid pk \"{product}\" - object does not exist."),
            );
        }

        let requested: BTreeSet<i32> = option_values.iter().copied().collect();
        let ids: Vec<i32> = requested.iter().copied().collect();
        let found: BTreeSet<i32> = catalog
            .existing_option_values(&ids)
            .await?
            .iter()
            .map(OptionValueId::as_i32)
            .collect();
        if let Some(missing) = requested.difference(&found).next() {
            errors.add(
                "option_values",
                format!("Invalid pk \"{missing}\" - object does not exist."),
            );
        }

        errors.into_result(())?;
        Ok(requested.into_iter().map(OptionValueId::new).collect())
    }
}

fn quantity_too_large() -> ValidationErrors {
    ValidationErrors::single(
        "quantity",
        format!("Ensure this value is less than or equal to {MAX_LINE_QUANTITY}."),
    )
}

/// An integer from a JSON number or a numeric string.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Accept a quantity in `1..=MAX_LINE_QUANTITY`.
fn positive_quantity(quantity: i64) -> Result<u32, ValidationErrors> {
    if quantity < 1 {
        return Err(ValidationErrors::single(
            "quantity",
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    match u32::try_from(quantity) {
        Ok(q) if q <= MAX_LINE_QUANTITY => Ok(q),
        _ => Err(quantity_too_large()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_quantity_bounds() {
        assert_eq!(positive_quantity(1), Ok(1));
        assert_eq!(positive_quantity(10_000), Ok(10_000));
        assert!(positive_quantity(0).is_err());
        assert!(positive_quantity(-3).is_err());
        assert!(positive_quantity(10_001).is_err());
        assert!(positive_quantity(i64::MAX).is_err());
    }

    #[test]
    fn test_negative_quantity_is_keyed_on_quantity() {
        let errors = positive_quantity(-1).unwrap_err();
        assert_eq!(
            errors.get("quantity"),
            Some("Ensure this value is greater than or equal to 1.")
        );
    }

    #[test]
    fn test_add_request_accepts_filter_values_alias() {
        let request: AddLine =
            serde_json::from_str(r#"{"product": 3, "filter_values": [4, 2]}"#).unwrap();
        assert_eq!(request.validate(), Ok((ProductId::new(3), 1)));
        assert_eq!(request.option_values, vec![4, 2]);
    }

    #[test]
    fn test_add_request_missing_product_is_keyed() {
        let request: AddLine = serde_json::from_str(r#"{"quantity": 2}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.get("product"), Some("This field is required."));
        assert_eq!(errors.get("quantity"), None);
    }

    #[test]
    fn test_add_request_bad_quantity_is_keyed() {
        let request: AddLine =
            serde_json::from_str(r#"{"product": 1, "quantity": "abc"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.get("quantity"), Some("A valid integer is required."));
        assert_eq!(errors.get("product"), None);

        let request: AddLine = serde_json::from_str(r#"{"product": 1, "quantity": 1.5}"#).unwrap();
        assert!(request.validate().unwrap_err().get("quantity").is_some());
    }

    #[test]
    fn test_add_request_reports_every_bad_field() {
        let request: AddLine =
            serde_json::from_str(r#"{"product": "jacket", "quantity": 0}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(
            errors.get("product"),
            Some("Incorrect type. Expected pk value, received str.")
        );
        assert_eq!(
            errors.get("quantity"),
            Some("Ensure this value is greater than or equal to 1.")
        );
    }

    #[test]
    fn test_add_request_accepts_numeric_strings() {
        let request: AddLine =
            serde_json::from_str(r#"{"product": "7", "quantity": "3", "option_values": []}"#)
                .unwrap();
        assert_eq!(request.validate(), Ok((ProductId::new(7), 3)));
        assert_eq!(
            AddLine::new(ProductId::new(7), 3, vec![]).validate(),
            Ok((ProductId::new(7), 3))
        );
    }

    #[test]
    fn test_update_request_quantity() {
        let request: UpdateLine = serde_json::from_str("{}").unwrap();
        assert_eq!(
            request.quantity().unwrap_err().get("quantity"),
            Some("This field is required.")
        );

        let request: UpdateLine = serde_json::from_str(r#"{"quantity": "many"}"#).unwrap();
        assert_eq!(
            request.quantity().unwrap_err().get("quantity"),
            Some("A valid integer is required.")
        );

        let request: UpdateLine = serde_json::from_str(r#"{"quantity": -2}"#).unwrap();
        assert_eq!(request.quantity(), Ok(-2));
    }
}
