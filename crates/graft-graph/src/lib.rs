//! Dependency graphs with deterministic topological ordering.
//!
//! [`DependencyGraph`] stores "depends on" edges and produces a linear
//! order in which every vertex appears before everything reachable from it,
//! with ties broken by a caller-supplied *stability list*. Both the shared
//! object store (init order) and the update propagation tree (handler
//! sweep order) are built on it.
//!
//! # Invariants
//!
//! - The stability list names every vertex exactly once, in the order ties
//!   should be broken.
//! - A cycle is reported, never tolerated: the partial order produced
//!   before the cycle is returned for diagnosis.

pub mod error;
pub mod topo;

pub use error::GraphError;
pub use topo::DependencyGraph;
