//! Line items and the sanitizing draft boundary.
//!
//! A [`CartItem`] is always well-typed: every numeric field is a real
//! number by the time it exists. Untyped input from upstream (form posts,
//! persisted JSON, the catalog page) enters through [`ItemDraft`], which
//! coerces string-typed numerics and substitutes safe defaults instead of
//! failing. The reducer's arithmetic never has to re-validate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{Discount, discounted_unit_price};

// =============================================================================
// Identity Newtypes
// =============================================================================

/// Identity of a line within a cart.
///
/// Minted when the line is appended, stable across quantity edits, never
/// reused. Two lines for the same product (one purchase, one rental) have
/// distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(Uuid);

impl LineItemId {
    /// Mint a fresh line id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to an external catalog entry.
///
/// Not unique within a cart: a product may appear as both a purchase line
/// and a separate rental line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Wrap a catalog reference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying catalog reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// Whether a line is bought outright or rented by the day.
///
/// The kind participates in merge identity: adding a product already in the
/// cart merges only into the line of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Purchase,
    Rental,
}

/// One purchasable or rentable line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line identity, unique within the cart.
    pub id: LineItemId,
    /// Catalog reference; may repeat across kinds.
    pub product_id: ProductId,
    pub kind: ItemKind,
    /// Display title, snapshotted at add-time.
    pub title: String,
    /// Display image reference, snapshotted at add-time.
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Display description, snapshotted at add-time.
    #[serde(default)]
    pub description: Option<String>,
    /// Price actually charged per unit, after any promotional discount.
    pub unit_price: Decimal,
    /// Undiscounted price; equals `unit_price` when no discount applies.
    pub original_unit_price: Decimal,
    /// Positive for purchase lines; always 1 for rental lines.
    pub quantity: u32,
    /// Rental lines only: number of days rented.
    #[serde(default)]
    pub rental_days: Option<u32>,
    /// Rental lines only: charged rate per day (`unit_price == daily_rate * rental_days`).
    #[serde(default)]
    pub daily_rate: Option<Decimal>,
    /// Set when this line's discount originated from a promotion code.
    #[serde(default)]
    pub promo_code: Option<String>,
}

impl CartItem {
    /// Build a well-typed line item from an untyped draft.
    ///
    /// This is the single sanitizing constructor: negative prices clamp to
    /// zero, quantities below 1 become 1, rental lines get `quantity = 1`
    /// and a unit price derived from `daily_rate * rental_days`, and the
    /// draft's discount (if any) is folded into `unit_price`.
    #[must_use]
    pub fn from_draft(draft: ItemDraft) -> Self {
        let price = draft.price.max(Decimal::ZERO);

        match draft.kind {
            ItemKind::Purchase => {
                let unit_price = discounted_unit_price(price, draft.discount.as_ref());
                Self {
                    id: LineItemId::new(),
                    product_id: draft.product_id,
                    kind: ItemKind::Purchase,
                    title: draft.title,
                    image_ref: draft.image_ref,
                    description: draft.description,
                    unit_price,
                    original_unit_price: price,
                    quantity: draft.quantity.max(1),
                    rental_days: None,
                    daily_rate: None,
                    promo_code: draft.promo_code,
                }
            }
            ItemKind::Rental => {
                // Rentals vary by days, not quantity; a discount applies to
                // the daily rate so unit_price stays rate * days.
                let days = draft.rental_days.unwrap_or(1).max(1);
                let original_rate = draft.daily_rate.unwrap_or(price).max(Decimal::ZERO);
                let rate = discounted_unit_price(original_rate, draft.discount.as_ref());
                Self {
                    id: LineItemId::new(),
                    product_id: draft.product_id,
                    kind: ItemKind::Rental,
                    title: draft.title,
                    image_ref: draft.image_ref,
                    description: draft.description,
                    unit_price: rate * Decimal::from(days),
                    original_unit_price: original_rate * Decimal::from(days),
                    quantity: 1,
                    rental_days: Some(days),
                    daily_rate: Some(rate),
                    promo_code: draft.promo_code,
                }
            }
        }
    }
}

// =============================================================================
// Draft Boundary
// =============================================================================

/// Untyped add-to-cart input, before sanitization.
///
/// `price` and `quantity` accept JSON numbers *or* strings because the
/// upstream boundary is duck-typed; anything unparsable falls back to the
/// documented defaults (price 0, quantity 1) rather than failing the
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub product_id: ProductId,
    pub kind: ItemKind,
    pub title: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price for purchases; fallback daily rate for rentals.
    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub price: Decimal,
    #[serde(default = "default_quantity", deserialize_with = "lenient::quantity_or_one")]
    pub quantity: u32,
    #[serde(default)]
    pub rental_days: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub daily_rate: Option<Decimal>,
    /// Already-resolved promotional discount, if the catalog page carried one.
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub promo_code: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl ItemDraft {
    /// Draft for a purchase line.
    #[must_use]
    pub fn purchase(
        product_id: ProductId,
        title: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            kind: ItemKind::Purchase,
            title: title.into(),
            image_ref: None,
            description: None,
            price,
            quantity,
            rental_days: None,
            daily_rate: None,
            discount: None,
            promo_code: None,
        }
    }

    /// Draft for a rental line.
    #[must_use]
    pub fn rental(
        product_id: ProductId,
        title: impl Into<String>,
        daily_rate: Decimal,
        rental_days: u32,
    ) -> Self {
        Self {
            product_id,
            kind: ItemKind::Rental,
            title: title.into(),
            image_ref: None,
            description: None,
            price: Decimal::ZERO,
            quantity: 1,
            rental_days: Some(rental_days),
            daily_rate: Some(daily_rate),
            discount: None,
            promo_code: None,
        }
    }

    /// Attach an already-resolved promotional discount.
    #[must_use]
    pub fn with_discount(mut self, discount: Discount, promo_code: Option<String>) -> Self {
        self.discount = Some(discount);
        self.promo_code = promo_code;
        self
    }
}

/// Lenient deserializers for numerics crossing the untyped boundary.
mod lenient {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};

    /// A JSON value that should have been a number but may be a string.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    fn to_decimal(loose: Loose) -> Option<Decimal> {
        match loose {
            Loose::Number(n) => Decimal::try_from(n).ok(),
            Loose::Text(s) => Decimal::from_str(s.trim()).ok(),
            Loose::Other(_) => None,
        }
    }

    pub fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let loose = Option::<Loose>::deserialize(deserializer)?;
        Ok(loose.and_then(to_decimal).unwrap_or(Decimal::ZERO))
    }

    pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let loose = Option::<Loose>::deserialize(deserializer)?;
        Ok(loose.and_then(to_decimal))
    }

    pub fn quantity_or_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let loose = Option::<Loose>::deserialize(deserializer)?;
        let quantity = match loose {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(Loose::Number(n)) if n.is_finite() && n >= 1.0 => n.trunc() as u32,
            Some(Loose::Text(s)) => s.trim().parse::<u32>().ok().filter(|&q| q >= 1).unwrap_or(1),
            _ => 1,
        };
        Ok(quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_draft_coerces_string_numerics() {
        let draft: ItemDraft = serde_json::from_value(json!({
            "productId": "prod-9",
            "kind": "purchase",
            "title": "Boxed Set",
            "price": "19.99",
            "quantity": "3",
        }))
        .unwrap();

        assert_eq!(draft.price, dec!(19.99));
        assert_eq!(draft.quantity, 3);
    }

    #[test]
    fn test_draft_unparsable_numerics_default() {
        // Garbage price -> 0, garbage quantity -> 1, never an error
        let draft: ItemDraft = serde_json::from_value(json!({
            "productId": "prod-9",
            "kind": "purchase",
            "title": "Boxed Set",
            "price": "not-a-price",
            "quantity": {"nested": true},
        }))
        .unwrap();

        assert_eq!(draft.price, Decimal::ZERO);
        assert_eq!(draft.quantity, 1);
    }

    #[test]
    fn test_draft_missing_numerics_default() {
        let draft: ItemDraft = serde_json::from_value(json!({
            "productId": "prod-9",
            "kind": "purchase",
            "title": "Boxed Set",
        }))
        .unwrap();

        assert_eq!(draft.price, Decimal::ZERO);
        assert_eq!(draft.quantity, 1);
    }

    #[test]
    fn test_purchase_from_draft_applies_discount() {
        let draft = ItemDraft::purchase(ProductId::new("p"), "Title", dec!(59.99), 2)
            .with_discount(Discount::Percentage(dec!(20)), Some("SAVE20".to_owned()));
        let item = CartItem::from_draft(draft);

        assert_eq!(item.original_unit_price, dec!(59.99));
        assert_eq!(item.unit_price, dec!(47.992));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.promo_code.as_deref(), Some("SAVE20"));
    }

    #[test]
    fn test_purchase_negative_price_clamps_to_zero() {
        let item = CartItem::from_draft(ItemDraft::purchase(
            ProductId::new("p"),
            "Title",
            dec!(-5),
            0,
        ));
        assert_eq!(item.unit_price, Decimal::ZERO);
        assert_eq!(item.original_unit_price, Decimal::ZERO);
        // Quantity below 1 is normalized up
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_rental_unit_price_is_rate_times_days() {
        let item = CartItem::from_draft(ItemDraft::rental(
            ProductId::new("p"),
            "Title",
            dec!(4.50),
            5,
        ));
        assert_eq!(item.unit_price, dec!(22.50));
        assert_eq!(item.quantity, 1);
        assert_eq!(item.rental_days, Some(5));
        assert_eq!(item.daily_rate, Some(dec!(4.50)));
    }

    #[test]
    fn test_rental_discount_applies_to_daily_rate() {
        let draft = ItemDraft::rental(ProductId::new("p"), "Title", dec!(10), 3)
            .with_discount(Discount::Fixed(dec!(2)), Some("RENT2".to_owned()));
        let item = CartItem::from_draft(draft);

        assert_eq!(item.daily_rate, Some(dec!(8)));
        assert_eq!(item.unit_price, dec!(24));
        assert_eq!(item.original_unit_price, dec!(30));
        // Invariant: unit_price == daily_rate * rental_days
        assert_eq!(
            item.unit_price,
            item.daily_rate.unwrap() * Decimal::from(item.rental_days.unwrap())
        );
    }

    #[test]
    fn test_line_ids_are_unique() {
        let a = LineItemId::new();
        let b = LineItemId::new();
        assert_ne!(a, b);
    }
}
