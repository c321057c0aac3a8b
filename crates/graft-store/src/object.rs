use graft_types::{ContentHash, DynError};

use crate::store::SharedStore;

/// Contract a shared object must satisfy toward its store.
///
/// `C` is the context type forwarded through update propagation; `P` is the
/// parameter bundle handed to `init` and `start`. Identity methods are
/// required; every lifecycle hook defaults to a no-op.
///
/// The store calls the hooks in dependency order: for every object, its
/// dependencies are initialized and started before it, and stopped and
/// closed after it.
pub trait SharedObject<C: 'static, P: 'static>: 'static {
    /// Human-readable name. Folded into the fingerprint by convention, so
    /// it doubles as a type discriminator in logs.
    fn name(&self) -> &str;

    /// Content hash over the full construction parameter tuple. Objects
    /// with equal fingerprints (and equal runtime types) are collapsed
    /// into one canonical instance — they must be behaviorally identical.
    fn fingerprint(&self) -> &ContentHash;

    /// First lifecycle hook. Called once during store initialization to
    /// gather this object's requirements: call `store.register` for every
    /// object you depend on, and subscribe to the ones you want update
    /// notifications from.
    fn register_dependencies(&mut self, store: &mut SharedStore<C, P>) {
        let _ = store;
    }

    /// Called after all requirements are gathered, dependencies first.
    /// Set up initial state here; when `init` returns, the object must be
    /// able to receive calls from other objects.
    fn init(&mut self, params: &P) -> Result<(), DynError> {
        let _ = params;
        Ok(())
    }

    /// Post-init hook, same order as `init`. Intended for kicking off
    /// background producers, timers and the like.
    fn start(&mut self, params: &P) -> Result<(), DynError> {
        let _ = params;
        Ok(())
    }

    /// Pre-close hook, reverse order. Intended for stopping whatever
    /// `start` began.
    fn stop(&mut self) {}

    /// Final hook, reverse order. Free resources and ensure they are not
    /// used anywhere else.
    fn close(&mut self) {}
}
