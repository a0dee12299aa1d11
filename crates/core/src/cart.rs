//! The `Cart` aggregate and the promo-code projection.
//!
//! Derived fields (`total_amount`, `total_savings`, `applied_promo_codes`)
//! are private and only recomputed by the reducer; nothing outside this
//! crate can set them independently of item state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::item::{CartItem, LineItemId};
use crate::money::aggregate_totals;

/// The session identity a cart belongs to.
///
/// Anonymous shoppers share a single guest bucket; authenticated shoppers
/// get a per-user bucket. Persistence keys derive from this, so carts never
/// leak between users on a shared device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionIdentity {
    /// Authenticated user, keyed by their user id.
    User(String),
    /// Anonymous shopper.
    #[default]
    Guest,
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

/// Derive the de-duplicated list of promotion codes implied by `items`.
///
/// First-occurrence order is kept. Pure and O(n); the reducer re-derives
/// this after item mutations rather than patching incrementally, so the
/// projection can never drift from item state.
#[must_use]
pub fn active_promo_codes(items: &[CartItem]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for item in items {
        if let Some(code) = &item.promo_code
            && !codes.iter().any(|existing| existing == code)
        {
            codes.push(code.clone());
        }
    }
    codes
}

/// A shopper's in-progress order.
///
/// Mutated only through [`crate::reducer::reduce`]; an empty cart with
/// all-zero derived fields is the valid initial and terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub(crate) items: Vec<CartItem>,
    pub(crate) total_amount: Decimal,
    pub(crate) total_savings: Decimal,
    #[serde(default)]
    pub(crate) applied_promo_codes: Vec<String>,
    #[serde(default)]
    pub(crate) owner: SessionIdentity,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Cart {
    /// The canonical empty cart: no items, zero totals, no owner binding.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            total_savings: Decimal::ZERO,
            applied_promo_codes: Vec::new(),
            owner: SessionIdentity::Guest,
            updated_at: Utc::now(),
        }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of `unit_price * quantity` over items.
    #[must_use]
    pub const fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Sum of `(original_unit_price - unit_price) * quantity` over items.
    #[must_use]
    pub const fn total_savings(&self) -> Decimal {
        self.total_savings
    }

    /// Undiscounted total; always `total_amount + total_savings`.
    #[must_use]
    pub fn original_total(&self) -> Decimal {
        self.total_amount + self.total_savings
    }

    /// Promotion codes currently applied, first-applied first.
    #[must_use]
    pub fn applied_promo_codes(&self) -> &[String] {
        &self.applied_promo_codes
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// The session identity this cart belongs to.
    #[must_use]
    pub const fn owner(&self) -> &SessionIdentity {
        &self.owner
    }

    /// Timestamp of the last mutation; for cache-staleness reasoning only.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by id.
    #[must_use]
    pub fn item(&self, id: LineItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Re-bind the cart to a session identity.
    ///
    /// Called by the persistence layer after a load or clear; identity is
    /// owned by the session, not by any reducer action.
    pub fn rebind_owner(&mut self, owner: SessionIdentity) {
        self.owner = owner;
    }

    /// Recompute both derived totals from current items.
    pub(crate) fn recompute_totals(&mut self) {
        let totals = aggregate_totals(&self.items);
        self.total_amount = totals.discounted_total;
        self.total_savings = totals.savings;
    }

    /// Re-derive the applied-code list from current items.
    pub(crate) fn recompute_promo_codes(&mut self) {
        self.applied_promo_codes = active_promo_codes(&self.items);
    }
}
