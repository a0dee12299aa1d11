//! The cart state machine.
//!
//! [`reduce`] is the sole writer of cart state: every mutation is one of
//! the [`CartAction`] variants, and every transition is synchronous and
//! total. There is no invalid-input error path; malformed input is
//! normalized at the draft boundary before it reaches the reducer.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::item::{CartItem, ItemDraft, LineItemId};

/// A cart mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum CartAction {
    /// Replace state wholesale; used on load and identity switch.
    /// `None` becomes the canonical empty cart.
    SetCart(Option<Cart>),
    /// Append a new line or merge into an existing `(product_id, kind)` line.
    AddItem(ItemDraft),
    /// Drop the line with this id; unknown ids are a no-op.
    RemoveItem(LineItemId),
    /// Set a line's quantity; zero or below drops the line entirely.
    UpdateQuantity {
        item_id: LineItemId,
        quantity: i64,
    },
    /// Reset to the canonical empty cart for no particular owner.
    ClearCart,
    /// Fold in items repriced by the external promotion service.
    ///
    /// The reducer trusts its input here: validation and repricing already
    /// happened in the pricing authority.
    ApplyPromoCode {
        code: String,
        repriced_items: Vec<CartItem>,
    },
    /// Remove the code from the applied list. Does NOT revert item prices;
    /// this preserves the storefront's shipped behavior (see DESIGN.md).
    RemovePromoCode(String),
}

/// Apply one action to the cart, producing the next state.
///
/// Total and infallible: no action can fail, and after every transition the
/// derived totals equal their recomputation from the items.
#[must_use]
pub fn reduce(cart: Cart, action: CartAction) -> Cart {
    match action {
        CartAction::SetCart(payload) => payload.unwrap_or_else(Cart::empty),
        CartAction::AddItem(draft) => add_item(cart, draft),
        CartAction::RemoveItem(item_id) => remove_item(cart, item_id),
        CartAction::UpdateQuantity { item_id, quantity } => {
            update_quantity(cart, item_id, quantity)
        }
        CartAction::ClearCart => Cart::empty(),
        CartAction::ApplyPromoCode {
            code,
            repriced_items,
        } => apply_promo_code(cart, code, repriced_items),
        CartAction::RemovePromoCode(code) => remove_promo_code(cart, &code),
    }
}

fn add_item(mut cart: Cart, draft: ItemDraft) -> Cart {
    let draft_code = draft.promo_code.clone();
    let item = CartItem::from_draft(draft);

    // Merge identity is (product_id, kind): the same product can still hold
    // one purchase line and one rental line side by side.
    let existing = cart
        .items
        .iter_mut()
        .find(|line| line.product_id == item.product_id && line.kind == item.kind);

    match existing {
        Some(line) => line.quantity += item.quantity,
        None => cart.items.push(item),
    }

    cart.recompute_totals();
    cart.recompute_promo_codes();

    // Eager union: a code carried by the draft joins the list immediately,
    // even when the merged-into line does not carry it.
    if let Some(code) = draft_code
        && !cart.applied_promo_codes.contains(&code)
    {
        cart.applied_promo_codes.push(code);
    }

    cart.updated_at = Utc::now();
    cart
}

fn remove_item(mut cart: Cart, item_id: LineItemId) -> Cart {
    cart.items.retain(|line| line.id != item_id);
    cart.recompute_totals();
    cart.recompute_promo_codes();
    cart.updated_at = Utc::now();
    cart
}

fn update_quantity(mut cart: Cart, item_id: LineItemId, quantity: i64) -> Cart {
    if quantity <= 0 {
        // Quantity may not reach zero and remain; the line goes away.
        cart.items.retain(|line| line.id != item_id);
    } else if let Some(line) = cart.items.iter_mut().find(|line| line.id == item_id) {
        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
    }

    cart.recompute_totals();
    cart.updated_at = Utc::now();
    cart
}

fn apply_promo_code(mut cart: Cart, code: String, repriced_items: Vec<CartItem>) -> Cart {
    cart.items = repriced_items;
    if !cart.applied_promo_codes.contains(&code) {
        cart.applied_promo_codes.push(code);
    }
    cart.recompute_totals();
    cart.updated_at = Utc::now();
    cart
}

fn remove_promo_code(mut cart: Cart, code: &str) -> Cart {
    cart.applied_promo_codes.retain(|applied| applied != code);
    cart.updated_at = Utc::now();
    cart
}
