//! Deduplicating shared-object registry and lifecycle scheduler.
//!
//! A [`SharedStore`] lets consumers construct collaborators as if they were
//! sole owners: [`SharedStore::register`] transparently replaces the
//! caller's local instance with the canonical one whenever an object with
//! the same identity already exists. Identity is the pair (runtime type
//! tag, content hash of construction parameters) — see
//! [`graft_types::ObjectKey`].
//!
//! Once registered, the store collects the dependency DAG by asking each
//! object for its requirements, computes a deterministic initialization
//! order (dependencies first), and drives the lifecycle:
//!
//! ```text
//! register* -> init -> start -> stop -> close
//! ```
//!
//! `init` and `start` walk the order forward (dependencies before
//! dependents); `stop` and `close` walk it in reverse.
//!
//! # Design Rules
//!
//! 1. One store, one thread. Objects are `Rc<RefCell<_>>` and the store
//!    performs no internal locking.
//! 2. The store owns every canonical object; consumers hold shared
//!    references to it through their [`SharedRef`] slots.
//! 3. Two objects with the same key must be behaviorally identical. The
//!    store trusts the fingerprint; omitting a constructor parameter from
//!    it is the classic way to violate this.
//! 4. Cycles in the dependency graph are an error, reported at `init`.

pub mod error;
pub mod object;
pub mod slot;
pub mod store;

pub use error::StoreError;
pub use object::SharedObject;
pub use slot::{SharedRef, WeakSharedRef};
pub use store::{DynSharedObject, LifecyclePhase, SharedStore, StabilityPolicy};
