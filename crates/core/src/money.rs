//! Discount arithmetic and aggregate totals.
//!
//! All monetary values are [`Decimal`] so that percentage discounts stay
//! exact (e.g. 20% off 59.99 is exactly 11.998). Nothing here rounds;
//! rounding to currency precision is a display-layer concern.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::item::CartItem;

/// A promotional discount applied to a unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Discount {
    /// Percentage off the original price (e.g. `20` for 20% off).
    Percentage(Decimal),
    /// Fixed amount off the original price.
    Fixed(Decimal),
}

/// Compute the per-unit price after applying an optional discount.
///
/// Fail-soft by design: an absent discount or a negative discount value
/// returns `original` unchanged. The result is floored at zero, so a
/// percentage over 100 or a fixed amount larger than the price yields `0`,
/// never a negative price.
#[must_use]
pub fn discounted_unit_price(original: Decimal, discount: Option<&Discount>) -> Decimal {
    let Some(discount) = discount else {
        return original;
    };

    match *discount {
        Discount::Percentage(percent) => {
            if percent.is_sign_negative() {
                return original;
            }
            let discounted = original * (Decimal::ONE - percent / Decimal::ONE_HUNDRED);
            discounted.max(Decimal::ZERO)
        }
        Discount::Fixed(amount) => {
            if amount.is_sign_negative() {
                return original;
            }
            (original - amount).max(Decimal::ZERO)
        }
    }
}

/// Aggregate totals over a line-item collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of undiscounted unit prices times quantity.
    pub original_total: Decimal,
    /// Sum of charged unit prices times quantity.
    pub discounted_total: Decimal,
    /// Always `original_total - discounted_total`.
    pub savings: Decimal,
}

/// Sum the original and discounted totals over `items`.
///
/// `savings` is computed by subtraction only, so
/// `original_total == discounted_total + savings` holds by construction.
/// An empty slice yields all zeros.
#[must_use]
pub fn aggregate_totals(items: &[CartItem]) -> CartTotals {
    let mut original_total = Decimal::ZERO;
    let mut discounted_total = Decimal::ZERO;

    for item in items {
        let quantity = Decimal::from(item.quantity);
        original_total += item.original_unit_price * quantity;
        discounted_total += item.unit_price * quantity;
    }

    CartTotals {
        original_total,
        discounted_total,
        savings: original_total - discounted_total,
    }
}
