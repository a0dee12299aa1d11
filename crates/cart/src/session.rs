//! The live cart session.
//!
//! [`CartSession`] owns the in-memory cart for one client session. Every
//! mutation goes through the reducer, after which the full cart is written
//! through to the identity-scoped store. Persistence is an observer, never
//! a gate: a failed write is logged and the in-memory state stays
//! authoritative.

use tracing::instrument;

use backlot_core::{Cart, CartAction, ItemDraft, LineItemId, SessionIdentity, reduce};
use rust_decimal::Decimal;

use crate::promotion::PromotionService;
use crate::store::{CartStore, storage_key_for};

/// A shopper's cart session, bound to one session identity at a time.
#[derive(Debug)]
pub struct CartSession<S, P> {
    cart: Cart,
    identity: SessionIdentity,
    store: S,
    promotions: P,
}

impl<S: CartStore, P: PromotionService> CartSession<S, P> {
    /// Open a session for `identity`, restoring its persisted cart if one
    /// exists and is structurally valid; otherwise starting empty.
    pub fn open(identity: SessionIdentity, store: S, promotions: P) -> Self {
        let mut session = Self {
            cart: Cart::empty(),
            identity,
            store,
            promotions,
        };
        session.reload();
        session
    }

    /// Re-bind the session to a new identity and replace the cart with
    /// whatever is persisted for that identity.
    ///
    /// Replace, never merge: switching identity must not blend one user's
    /// items into another's.
    #[instrument(skip(self), fields(from = %self.identity, to = %identity))]
    pub fn identity_changed(&mut self, identity: SessionIdentity) {
        if identity == self.identity {
            return;
        }
        self.identity = identity;
        self.reload();
    }

    /// Add a line to the cart, merging into an existing `(product, kind)`
    /// line when present.
    #[instrument(skip(self, draft), fields(product_id = %draft.product_id))]
    pub fn add_to_cart(&mut self, draft: ItemDraft) {
        self.dispatch(CartAction::AddItem(draft));
    }

    /// Remove a line by id; unknown ids are a no-op.
    #[instrument(skip(self))]
    pub fn remove_from_cart(&mut self, item_id: LineItemId) {
        self.dispatch(CartAction::RemoveItem(item_id));
    }

    /// Set a line's quantity; zero or below removes the line.
    #[instrument(skip(self))]
    pub fn update_quantity(&mut self, item_id: LineItemId, quantity: i64) {
        self.dispatch(CartAction::UpdateQuantity { item_id, quantity });
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) {
        self.dispatch(CartAction::ClearCart);
    }

    /// Ask the promotion service to apply `code` to the current items.
    ///
    /// Returns `true` and folds the repriced items into state on success.
    /// Any service failure leaves the cart untouched and returns `false`;
    /// a code is never partially applied.
    ///
    /// This is the session's only suspend point. A completion that arrives
    /// after interleaved local mutations is applied against the
    /// then-current state; there is no cancellation fencing.
    #[instrument(skip(self))]
    pub async fn apply_promo_code(&mut self, code: &str) -> bool {
        match self.promotions.apply(code, self.cart.items()).await {
            Ok(repriced_items) => {
                self.dispatch(CartAction::ApplyPromoCode {
                    code: code.to_owned(),
                    repriced_items,
                });
                true
            }
            Err(e) => {
                tracing::warn!(code, error = %e, "promotion application failed");
                false
            }
        }
    }

    /// Remove a code from the applied list. Item prices are not reverted;
    /// this mirrors the shipped storefront behavior.
    #[instrument(skip(self))]
    pub fn remove_promo_code(&mut self, code: &str) {
        self.dispatch(CartAction::RemovePromoCode(code.to_owned()));
    }

    /// The discounted cart total; zero when empty.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.cart.total_amount()
    }

    /// The undiscounted cart total; zero when empty.
    #[must_use]
    pub fn original_total(&self) -> Decimal {
        self.cart.original_total()
    }

    /// Total promotional savings; zero when empty.
    #[must_use]
    pub fn total_savings(&self) -> Decimal {
        self.cart.total_savings()
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Promotion codes currently applied, first-applied first.
    #[must_use]
    pub fn applied_promo_codes(&self) -> &[String] {
        self.cart.applied_promo_codes()
    }

    /// The current cart state.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The identity this session is currently bound to.
    #[must_use]
    pub const fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Run one action through the reducer and write the result through.
    fn dispatch(&mut self, action: CartAction) {
        tracing::debug!(identity = %self.identity, ?action, "dispatching cart action");
        let current = std::mem::replace(&mut self.cart, Cart::empty());
        self.cart = reduce(current, action);
        self.cart.rebind_owner(self.identity.clone());
        self.persist();
    }

    /// Load the persisted cart for the current identity, or start empty.
    fn reload(&mut self) {
        let key = storage_key_for(&self.identity);
        let action = match self.store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Cart>(&raw) {
                Ok(cart) => CartAction::SetCart(Some(cart)),
                Err(e) => {
                    tracing::warn!(key, error = %e, "discarding corrupt persisted cart");
                    CartAction::ClearCart
                }
            },
            Ok(None) => CartAction::ClearCart,
            Err(e) => {
                tracing::warn!(key, error = %e, "cart load failed, starting empty");
                CartAction::ClearCart
            }
        };
        self.dispatch(action);
    }

    /// Best-effort write-through of the full cart under the current key.
    fn persist(&self) {
        let key = storage_key_for(&self.identity);
        let payload = match serde_json::to_string(&self.cart) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key, error = %e, "cart serialization failed, skipping persist");
                return;
            }
        };
        if let Err(e) = self.store.set(&key, &payload) {
            tracing::warn!(key, error = %e, "cart persist failed, in-memory state kept");
        }
    }
}
