// src/lib.rs

//! cartsync: keeps a shopper's in-memory cart in step with a per-user remote
//! cart document.
//!
//! The pieces:
//!  - `cart`: immutable cart snapshots and the pure mutations between them
//!    (add, remove, increase, decrease, clear).
//!  - `store`: what the synchronizer needs from a document store (point read,
//!    full overwrite, order append/list) and an in-memory JSON implementation.
//!  - `identity`: who is signed in, and whether that is known yet.
//!  - `sync`: the `CartSynchronizer`, which fetches on sign-in, resets on
//!    sign-out, and writes every change through once the initial fetch is done.
//!  - `flow`: the small step runner the synchronizer uses for its load,
//!    write-through and checkout sequences.

pub mod cart;
pub mod config;
pub mod error;
pub mod flow;
pub mod identity;
pub mod order;
pub mod shared;
pub mod store;
pub mod sync;

// --- Re-exports for the Public API ---

pub use crate::cart::{Cart, CartMutation, LineItem, Product, ProductId};
pub use crate::config::SyncConfig;
pub use crate::error::{StoreError, SyncError, SyncResult};
pub use crate::flow::{Flow, FlowControl, FlowOutcome};
pub use crate::identity::{Identity, IdentityGate, UserId};
pub use crate::order::{Order, PaymentMethod, ShippingDetails};
pub use crate::shared::Shared;
pub use crate::store::{CartRecord, CartStore, InMemoryDocumentStore, OrderStore};
pub use crate::sync::{CartSynchronizer, LoadState, SyncNotice};

/*
    Typical wiring:
    1. Build a store (`InMemoryDocumentStore`, or your own `CartStore` + `OrderStore`).
    2. `CartSynchronizer::new(store.clone(), store, SyncConfig::from_env()?)` inside a tokio runtime.
    3. Spawn `sync.follow_identity(gate.subscribe())` so sign-in/out drive loading.
    4. Call `add_item` / `remove_item` / `increase_qty` / `decrease_qty` / `clear` from UI events;
       they return the new `Cart` immediately.
    5. Show `subscribe_notices()` as toasts; `is_loading()` as a spinner.
*/
