//! Backlot Cart - identity-scoped cart session and promotion client.
//!
//! This crate wraps the pure domain in `backlot-core` with the three
//! impure concerns the storefront needs:
//!
//! - [`session`] - the [`CartSession`](session::CartSession) owning the
//!   live cart, dispatching reducer actions and persisting after each one
//! - [`store`] - the identity-scoped key-value persistence boundary
//! - [`promotion`] - the client for the external Promotion Application
//!   Service that validates codes and reprices items
//!
//! # Concurrency
//!
//! Dispatch is single-threaded and cooperative: every action runs to
//! completion before the next is processed, so the cart needs no locking.
//! The only suspend point is the promotion apply round trip; a completion
//! that lands after interleaved local mutations is applied against the
//! then-current state (see `DESIGN.md` for why this race is kept).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod promotion;
pub mod session;
pub mod store;

pub use config::{ConfigError, PromotionApiConfig};
pub use promotion::{HttpPromotionClient, PromotionError, PromotionService};
pub use session::CartSession;
pub use store::{CartStore, MemoryStore, StoreError, storage_key_for};
