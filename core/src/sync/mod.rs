// cartsync/src/sync/mod.rs

//! Bridges the in-memory cart to the remote cart store.
//!
//! Identity changes drive loading (fetch on sign-in, reset on sign-out);
//! local mutations drive write-through. The `LoadState` guard keeps a
//! write-through from landing before the initial fetch, which would otherwise
//! overwrite a saved cart with an empty one.

mod checkout;
mod load;
pub mod notice;
pub mod session;
pub mod synchronizer;
mod write_through;

pub use notice::SyncNotice;
pub use session::LoadState;
pub use synchronizer::CartSynchronizer;
