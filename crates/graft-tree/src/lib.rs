//! Update propagation tree and pull-model event buffering.
//!
//! This crate implements the event side of the graft runtime:
//!
//! - [`UpdateNode`] — a vertex of the update propagation tree. Nodes
//!   subscribe to each other, and a notification at any node sweeps its
//!   transitive downstream set in DAG-consistent order, firing each
//!   affected handler exactly once per pass even when handlers themselves
//!   emit further notifications.
//! - [`PullBuffer`] / [`EventPuller`] — a producer-owned event log from
//!   which each registered consumer pulls at its own pace; slots are
//!   reclaimed once every consumer has observed them.
//!
//! # Threading
//!
//! Everything here is single-threaded by contract. The propagation flags
//! are plain `Cell`s and would corrupt under concurrent mutation; an
//! embedder with a background event source must serialize its external
//! `notify_updated` calls (a mutex around the call site is the documented
//! approach). Notifications originating *inside* a pass need no lock.

pub mod node;
pub mod pull;

pub use node::{NodeId, UpdateHandler, UpdateNode};
pub use pull::{EventPuller, PullBuffer};
