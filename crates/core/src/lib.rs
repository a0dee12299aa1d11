//! Backlot Core - cart and promotion pricing domain.
//!
//! This crate implements the one subsystem of the storefront with genuine
//! invariants: the in-progress order (cart), its line items, promotional
//! discount arithmetic, and the state machine that is the sole writer of
//! cart state.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no HTTP clients. The impure shell (identity-scoped storage
//! and the promotion service client) lives in `backlot-cart`.
//!
//! # Modules
//!
//! - [`money`] - Discount arithmetic and aggregate totals
//! - [`item`] - Line items and the sanitizing draft boundary
//! - [`cart`] - The `Cart` aggregate and promo-code projection
//! - [`reducer`] - The cart state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod item;
pub mod money;
pub mod reducer;

pub use cart::{Cart, SessionIdentity, active_promo_codes};
pub use item::{CartItem, ItemDraft, ItemKind, LineItemId, ProductId};
pub use money::{CartTotals, Discount, aggregate_totals, discounted_unit_price};
pub use reducer::{CartAction, reduce};
