//! High-level façade for the graft shared-object runtime.
//!
//! This is the main entry point for applications embedding graft. It binds
//! the pieces together: an object carries an [`ObjectCore`] (identity +
//! update node), registers itself and its dependencies with a
//! [`SharedStore`], and exchanges updates through the propagation tree,
//! optionally publishing payloads through a [`PullBuffer`] via
//! [`PublishingCore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use graft_sdk::{Fingerprint, ObjectCore, SharedObject, SharedRef, SharedStore};
//!
//! struct Counter {
//!     core: ObjectCore<Ctx>,
//!     value: i64,
//! }
//!
//! impl Counter {
//!     fn build(start: i64) -> SharedRef<Counter> {
//!         SharedRef::new(Counter {
//!             // Every construction parameter goes into the fingerprint.
//!             core: ObjectCore::new(Fingerprint::new("Counter").field(&start)),
//!             value: start,
//!         })
//!     }
//! }
//!
//! let mut store = SharedStore::<Ctx, Params>::new();
//! let mut strategy = Strategy::build("BTC", 2, 5); // builds its own Counter
//! store.register(&mut strategy);
//! store.init(params)?;   // dedups, orders, initializes dependencies first
//! store.start()?;
//! // ... events flow through the update tree ...
//! store.stop();
//! store.close();
//! ```

pub mod object;
pub mod publish;

pub use object::ObjectCore;
pub use publish::PublishingCore;

// Re-export the embedding surface.
pub use graft_hash::Fingerprint;
pub use graft_store::{
    DynSharedObject, LifecyclePhase, SharedObject, SharedRef, SharedStore, StabilityPolicy,
    StoreError, WeakSharedRef,
};
pub use graft_tree::{EventPuller, NodeId, PullBuffer, UpdateNode};
pub use graft_types::{ContentHash, DynError, EventTime, ObjectKey};
