//! Percentage discount applied to a product's list price.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Error returned when a discount is outside `0..=100`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("discount must be between 0 and 100 percent (got {0})")]
pub struct DiscountError(pub i64);

/// A whole-number discount percentage in `0..=100`.
///
/// Products carry a discount ("sale") that is clamped at the product level;
/// constructing a `Discount` is the only place that range is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Discount(u8);

impl Discount {
    /// No discount.
    pub const NONE: Self = Self(0);

    /// Largest allowed discount.
    pub const MAX_PERCENT: u8 = 100;

    /// Create a discount from a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError`] if `percent` is greater than 100.
    pub const fn new(percent: u8) -> Result<Self, DiscountError> {
        if percent > Self::MAX_PERCENT {
            return Err(DiscountError(percent as i64));
        }
        Ok(Self(percent))
    }

    /// The percentage as an integer.
    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// Whether this discount changes the price at all.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Discount {
    type Error = DiscountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| DiscountError(value))
            .and_then(Self::new)
    }
}

impl TryFrom<i16> for Discount {
    type Error = DiscountError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<Discount> for i16 {
    fn from(discount: Discount) -> Self {
        Self::from(discount.0)
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl<'de> Deserialize<'de> for Discount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Discount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Discount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Discount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i16::from(*self), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(Discount::new(0).map(Discount::percent), Ok(0));
        assert_eq!(Discount::new(100).map(Discount::percent), Ok(100));
        assert_eq!(Discount::new(101), Err(DiscountError(101)));
        assert_eq!(Discount::try_from(-1_i64), Err(DiscountError(-1)));
        assert_eq!(Discount::try_from(250_i16), Err(DiscountError(250)));
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let ok: Result<Discount, _> = serde_json::from_str("15");
        assert_eq!(ok.ok(), Discount::new(15).ok());

        let bad: Result<Discount, _> = serde_json::from_str("120");
        assert!(bad.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Discount::NONE.to_string(), "0%");
        assert!(Discount::NONE.is_zero());
    }
}
