use thiserror::Error;

use graft_types::{DynError, ObjectKey};

/// Errors from store lifecycle operations.
///
/// Programmer errors (null fingerprints, id collisions across types,
/// cyclic update subscriptions) panic instead; these variants cover the
/// recoverable surface returned to the embedder.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `init` was called more than once.
    #[error("shared object store is already initialized")]
    AlreadyInitialized,

    /// `start` was called before a successful `init` while objects exist.
    #[error("shared object store was not initialized")]
    NotInitialized,

    /// The collected dependency graph contains a cycle. `partial` holds
    /// the objects that could be ordered before the cycle was hit.
    #[error("cyclic dependencies between shared objects: only {} of them could be ordered", .partial.len())]
    CyclicDependencies { partial: Vec<ObjectKey> },

    /// An object's `init` hook failed. Objects later in the order were
    /// not touched.
    #[error("failed to initialize shared object {key}")]
    ObjectInit {
        key: ObjectKey,
        #[source]
        source: DynError,
    },

    /// An object's `start` hook failed. Objects later in the order were
    /// not touched.
    #[error("failed to start shared object {key}")]
    ObjectStart {
        key: ObjectKey,
        #[source]
        source: DynError,
    },
}
