//! Foundation types for the graft shared-object runtime.
//!
//! This crate provides the identity and timing primitives used throughout
//! the graft workspace. Every other graft crate depends on `graft-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] — digest of an object's construction parameters
//! - [`ObjectKey`] — store identity: runtime type tag folded with the hash
//! - [`EventTime`] — informational wall-clock stamp carried by update passes
//! - [`DynError`] — boxed user error propagated through lifecycle hooks

pub mod error;
pub mod hash;
pub mod key;
pub mod time;

pub use error::TypeError;
pub use hash::ContentHash;
pub use key::ObjectKey;
pub use time::EventTime;

/// Boxed error returned by user lifecycle hooks (`init`, `start`).
///
/// The runtime never inspects these; they are propagated verbatim to the
/// embedder. No `Send` bound: a store and its objects are confined to one
/// thread by contract.
pub type DynError = Box<dyn std::error::Error + 'static>;
