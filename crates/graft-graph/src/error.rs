use std::fmt;

use thiserror::Error;

/// Errors from topological ordering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError<K: fmt::Debug> {
    /// The stability list does not cover the graph's vertices exactly once.
    #[error("stability list does not match graph: {vertices} vertices, {stability} stability entries")]
    StabilityMismatch { vertices: usize, stability: usize },

    /// The graph contains a cycle. `partial` holds the vertices that were
    /// ordered before the cycle was hit, for diagnosis.
    #[error("cyclic dependencies: only {} of {vertices} vertices could be ordered", .partial.len())]
    Cycle { partial: Vec<K>, vertices: usize },
}
