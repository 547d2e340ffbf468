//! Line pricing with exact decimal arithmetic.
//!
//! Prices are `rust_decimal::Decimal` values in the store currency. Nothing in
//! this module touches binary floating point.
//!
//! Rounding happens exactly once per line: [`line_total`] rounds to cents
//! with banker's rounding, the same rule `NUMERIC(10,2)` storage applies. An
//! order total is the plain sum of rounded line totals, so it always equals
//! the sum of the lines it was built from.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::Discount;

/// Number of fraction digits in stored money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Unit price after applying a percentage discount.
///
/// `list_price - list_price * discount / 100`, unrounded.
#[must_use]
pub fn effective_unit_price(list_price: Decimal, discount: Discount) -> Decimal {
    if discount.is_zero() {
        return list_price;
    }
    list_price - list_price * Decimal::from(discount.percent()) / Decimal::ONE_HUNDRED
}

/// Total for `quantity` units at the discounted price, rounded to cents.
#[must_use]
pub fn line_total(list_price: Decimal, discount: Discount, quantity: u32) -> Decimal {
    to_money(effective_unit_price(list_price, discount) * Decimal::from(quantity))
}

/// Round an amount to cents and pin its scale to two fraction digits.
///
/// `230` becomes `230.00`, so serialized amounts always carry two digits.
#[must_use]
pub fn to_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Sum a sequence of line totals.
#[must_use]
pub fn sum_totals<I>(totals: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    to_money(totals.into_iter().sum())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pct(p: u8) -> Discount {
        Discount::new(p).unwrap()
    }

    #[test]
    fn test_effective_unit_price() {
        assert_eq!(effective_unit_price(dec("100.00"), pct(10)), dec("90"));
        assert_eq!(effective_unit_price(dec("50.00"), Discount::NONE), dec("50.00"));
        assert_eq!(effective_unit_price(dec("80.00"), pct(100)), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_has_two_fraction_digits() {
        let total = line_total(dec("100.00"), pct(10), 2);
        assert_eq!(total.to_string(), "180.00");
        assert_eq!(line_total(dec("0"), pct(0), 3).to_string(), "0.00");
    }

    #[test]
    fn test_line_total_rounds_half_even() {
        // 19.99 * 85% = 16.9915 -> 16.99
        assert_eq!(line_total(dec("19.99"), pct(15), 1), dec("16.99"));
        // 0.05 * 50% = 0.025 -> 0.02 (half to even)
        assert_eq!(line_total(dec("0.05"), pct(50), 1), dec("0.02"));
        // 0.15 * 50% = 0.075 -> 0.08 (half to even)
        assert_eq!(line_total(dec("0.15"), pct(50), 1), dec("0.08"));
    }

    #[test]
    fn test_line_total_matches_closed_form() {
        let prices = ["0.00", "0.01", "9.99", "19.95", "100.00", "1234.56", "99999999.99"];
        for price in prices {
            for discount in [0_u8, 1, 7, 10, 33, 50, 99, 100] {
                for quantity in [1_u32, 2, 3, 17, 250] {
                    let list = dec(price);
                    let expected = to_money(
                        list * Decimal::from(100 - discount) / Decimal::ONE_HUNDRED
                            * Decimal::from(quantity),
                    );
                    assert_eq!(
                        line_total(list, pct(discount), quantity),
                        expected,
                        "price={price} discount={discount} quantity={quantity}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_penny_drift_over_many_lines() {
        // 0.10 is not representable in binary floating point.
        let lines = std::iter::repeat_n(line_total(dec("0.10"), Discount::NONE, 1), 1000);
        assert_eq!(sum_totals(lines), dec("100.00"));
    }

    #[test]
    fn test_to_money_rescales() {
        assert_eq!(to_money(dec("230")).to_string(), "230.00");
        assert_eq!(to_money(dec("1.5")).to_string(), "1.50");
    }
}
