//! Integration tests for the cart session: identity-scoped persistence,
//! write-through, and the promotion apply boundary.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use backlot_cart::{CartSession, CartStore, MemoryStore, StoreError, storage_key_for};
use backlot_cart::{PromotionError, PromotionService};
use backlot_core::{Cart, CartItem, ItemDraft, ProductId, SessionIdentity};

// =============================================================================
// Test Doubles
// =============================================================================

/// Promotion service that applies a 20% discount and stamps the code on
/// every item, like the real pricing authority would.
struct RepricingPromotions;

impl PromotionService for RepricingPromotions {
    async fn apply(
        &self,
        code: &str,
        items: &[CartItem],
    ) -> Result<Vec<CartItem>, PromotionError> {
        Ok(items
            .iter()
            .cloned()
            .map(|mut item| {
                item.unit_price = item.original_unit_price * dec!(0.8);
                item.promo_code = Some(code.to_owned());
                item
            })
            .collect())
    }
}

/// Promotion service that rejects every code.
struct RejectingPromotions;

impl PromotionService for RejectingPromotions {
    async fn apply(
        &self,
        _code: &str,
        _items: &[CartItem],
    ) -> Result<Vec<CartItem>, PromotionError> {
        Err(PromotionError::Rejected("no such code".to_owned()))
    }
}

/// Store whose reads succeed but whose writes always fail.
#[derive(Default)]
struct WriteFailingStore {
    inner: MemoryStore,
}

impl CartStore for WriteFailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Write("disk full".to_owned()))
    }
}

fn user(id: &str) -> SessionIdentity {
    SessionIdentity::User(id.to_owned())
}

fn draft(product: &str, price: Decimal, quantity: u32) -> ItemDraft {
    ItemDraft::purchase(ProductId::new(product), "Title", price, quantity)
}

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn test_empty_session_accessors_return_zero() {
    let store = MemoryStore::new();
    let session = CartSession::open(SessionIdentity::Guest, &store, RejectingPromotions);

    assert_eq!(session.cart_total(), Decimal::ZERO);
    assert_eq!(session.original_total(), Decimal::ZERO);
    assert_eq!(session.total_savings(), Decimal::ZERO);
    assert_eq!(session.item_count(), 0);
    assert!(session.applied_promo_codes().is_empty());
}

// =============================================================================
// Write-Through Persistence
// =============================================================================

#[test]
fn test_every_mutation_writes_through() {
    let store = MemoryStore::new();
    let mut session = CartSession::open(user("u1"), &store, RejectingPromotions);
    session.add_to_cart(draft("a", dec!(10), 2));

    let key = storage_key_for(&user("u1"));
    let raw = store.get(&key).expect("read").expect("persisted payload");
    let persisted: Cart = serde_json::from_str(&raw).expect("valid cart JSON");

    assert_eq!(persisted.items().len(), 1);
    assert_eq!(persisted.total_amount(), dec!(20));
    assert_eq!(persisted.owner(), &user("u1"));
}

#[test]
fn test_corrupt_persisted_payload_starts_empty() {
    let store = MemoryStore::new();
    let key = storage_key_for(&user("u1"));
    store.set(&key, "{not json").expect("seed store");

    let session = CartSession::open(user("u1"), &store, RejectingPromotions);
    assert_eq!(session.item_count(), 0);
    assert_eq!(session.cart_total(), Decimal::ZERO);
}

#[test]
fn test_write_failure_keeps_in_memory_state_authoritative() {
    let store = WriteFailingStore::default();
    let mut session = CartSession::open(user("u1"), &store, RejectingPromotions);

    session.add_to_cart(draft("a", dec!(10), 2));
    session.add_to_cart(draft("b", dec!(5), 1));

    // Nothing persisted, but the session never noticed
    assert_eq!(session.item_count(), 3);
    assert_eq!(session.cart_total(), dec!(25));
}

// =============================================================================
// Identity Switching
// =============================================================================

#[test]
fn test_identity_switch_replaces_and_restores() {
    let store = MemoryStore::new();
    let mut session = CartSession::open(user("u1"), &store, RejectingPromotions);
    session.add_to_cart(draft("a", dec!(10), 1));
    session.add_to_cart(draft("b", dec!(5), 1));
    let u1_items = session.cart().items().to_vec();

    // u2 has no stored cart: empty, never a blend of u1's items
    session.identity_changed(user("u2"));
    assert_eq!(session.item_count(), 0);
    assert_eq!(session.identity(), &user("u2"));

    // Switching back restores u1's cart unchanged
    session.identity_changed(user("u1"));
    assert_eq!(session.cart().items(), u1_items.as_slice());
    assert_eq!(session.cart_total(), dec!(15));
}

#[test]
fn test_switch_to_same_identity_is_noop() {
    let store = MemoryStore::new();
    let mut session = CartSession::open(user("u1"), &store, RejectingPromotions);
    session.add_to_cart(draft("a", dec!(10), 1));

    session.identity_changed(user("u1"));
    assert_eq!(session.item_count(), 1);
}

#[test]
fn test_guest_cart_does_not_leak_into_user_cart() {
    let store = MemoryStore::new();
    let mut session = CartSession::open(SessionIdentity::Guest, &store, RejectingPromotions);
    session.add_to_cart(draft("a", dec!(10), 1));

    // Login: the user's bucket is empty, the guest bucket is untouched
    session.identity_changed(user("u1"));
    assert_eq!(session.item_count(), 0);

    // Logout: guest cart is still there for the next anonymous shopper
    session.identity_changed(SessionIdentity::Guest);
    assert_eq!(session.item_count(), 1);
}

// =============================================================================
// Promotion Application
// =============================================================================

#[tokio::test]
async fn test_apply_promo_code_reprices_and_records_code() {
    let store = MemoryStore::new();
    let mut session = CartSession::open(user("u1"), &store, RepricingPromotions);
    session.add_to_cart(draft("a", dec!(59.99), 1));

    let applied = session.apply_promo_code("SAVE20").await;
    assert!(applied);
    assert_eq!(session.applied_promo_codes(), ["SAVE20"]);
    assert_eq!(session.cart_total(), dec!(47.992));
    assert_eq!(session.total_savings(), dec!(11.998));
    assert_eq!(session.original_total(), dec!(59.99));

    // The repriced cart was written through
    let key = storage_key_for(&user("u1"));
    let raw = store.get(&key).expect("read").expect("persisted payload");
    let persisted: Cart = serde_json::from_str(&raw).expect("valid cart JSON");
    assert_eq!(persisted.total_amount(), dec!(47.992));
}

#[tokio::test]
async fn test_apply_promo_failure_leaves_state_byte_identical() {
    let store = MemoryStore::new();
    let mut session = CartSession::open(user("u1"), &store, RejectingPromotions);
    session.add_to_cart(draft("a", dec!(10), 2));

    let before = serde_json::to_string(session.cart()).expect("serialize");
    let applied = session.apply_promo_code("BADCODE").await;
    let after = serde_json::to_string(session.cart()).expect("serialize");

    assert!(!applied);
    assert_eq!(before, after);
    assert!(session.applied_promo_codes().is_empty());
    assert_eq!(session.cart_total(), dec!(20));
}

#[tokio::test]
async fn test_remove_promo_code_keeps_discounted_prices() {
    // Known asymmetry, preserved from the shipped storefront: removing the
    // label does not reprice items back to their original price.
    let store = MemoryStore::new();
    let mut session = CartSession::open(user("u1"), &store, RepricingPromotions);
    session.add_to_cart(draft("a", dec!(10), 1));

    assert!(session.apply_promo_code("SAVE20").await);
    assert_eq!(session.cart_total(), dec!(8.0));

    session.remove_promo_code("SAVE20");
    assert!(session.applied_promo_codes().is_empty());
    assert_eq!(session.cart_total(), dec!(8.0));
    assert_eq!(session.total_savings(), dec!(2.0));
}

// =============================================================================
// End-to-End Flow
// =============================================================================

#[tokio::test]
async fn test_full_shopping_flow() {
    let store = MemoryStore::new();
    let mut session = CartSession::open(SessionIdentity::Guest, &store, RepricingPromotions);

    session.add_to_cart(draft("a", dec!(19.99), 1));
    session.add_to_cart(draft("a", dec!(19.99), 2)); // merges
    session.add_to_cart(ItemDraft::rental(ProductId::new("b"), "Rental", dec!(2.50), 4));
    assert_eq!(session.cart().items().len(), 2);
    assert_eq!(session.item_count(), 4);
    assert_eq!(session.cart_total(), dec!(69.97));

    assert!(session.apply_promo_code("SAVE20").await);
    assert_eq!(session.cart_total(), dec!(55.976));

    let rental_id = session.cart().items()[1].id;
    session.remove_from_cart(rental_id);
    assert_eq!(session.cart().items().len(), 1);

    let purchase_id = session.cart().items()[0].id;
    session.update_quantity(purchase_id, 0);
    assert_eq!(session.item_count(), 0);
    assert_eq!(session.cart_total(), Decimal::ZERO);

    session.clear_cart();
    assert!(session.cart().is_empty());
}
