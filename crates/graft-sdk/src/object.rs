use std::fmt;

use graft_hash::Fingerprint;
use graft_tree::UpdateNode;
use graft_types::{ContentHash, EventTime};

/// Identity and update plumbing embedded in every shared object.
///
/// An `ObjectCore` owns the object's name, its content hash, and its vertex
/// in the update propagation tree. User types embed one and delegate the
/// identity half of [`SharedObject`] to it.
///
/// The fingerprint passed to [`new`] must fold in **every** construction
/// parameter; see the `graft-hash` crate docs for why omitting one is the
/// single most dangerous mistake an implementer can make.
///
/// [`SharedObject`]: graft_store::SharedObject
/// [`new`]: ObjectCore::new
pub struct ObjectCore<C: 'static> {
    name: String,
    fingerprint: ContentHash,
    node: UpdateNode<C>,
}

impl<C: 'static> ObjectCore<C> {
    /// Build a core from a fingerprint, consuming its name for both the
    /// object and its update node.
    ///
    /// # Panics
    ///
    /// Panics if the fingerprint has no fields (see [`Fingerprint::digest`]).
    pub fn new(fingerprint: Fingerprint) -> Self {
        let name = fingerprint.name().to_owned();
        let hash = fingerprint.digest();
        Self {
            node: UpdateNode::new(name.clone()),
            name,
            fingerprint: hash,
        }
    }

    /// The object's human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object's content hash.
    pub fn fingerprint(&self) -> &ContentHash {
        &self.fingerprint
    }

    /// The object's vertex in the update propagation tree, for consumers
    /// that want to subscribe to it directly.
    pub fn update_node(&self) -> &UpdateNode<C> {
        &self.node
    }

    /// Register `downstream` to be notified whenever this object updates.
    ///
    /// Registration alone only shares the instance; a dependent that wants
    /// update notifications must also subscribe. Do this in
    /// `register_dependencies`, before the first event is sent.
    pub fn subscribe(&self, downstream: &ObjectCore<C>) {
        self.node.subscribe(downstream.update_node());
    }

    /// Node-level variant of [`subscribe`] for consumers without a core.
    ///
    /// [`subscribe`]: ObjectCore::subscribe
    pub fn subscribe_node(&self, downstream: &UpdateNode<C>) {
        self.node.subscribe(downstream);
    }

    /// Install the callback invoked when any subscription notified during
    /// an update pass.
    pub fn set_update_handler(&self, handler: impl FnMut(&C, EventTime) + 'static) {
        self.node.set_update_handler(handler);
    }

    /// Notify direct subscribers that something changed.
    pub fn notify_updated(&self, ctx: &C, at: EventTime) {
        self.node.notify_updated(ctx, at);
    }

    /// Transient introspection: `true` while this object's update is in
    /// flight within the current pass.
    pub fn has_updated(&self) -> bool {
        self.node.has_updated()
    }
}

impl<C: 'static> fmt::Debug for ObjectCore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCore")
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn core(name: &str, param: i64) -> ObjectCore<()> {
        ObjectCore::new(Fingerprint::new(name).field(&param))
    }

    #[test]
    fn core_carries_fingerprint_identity() {
        let a = core("Widget", 1);
        let b = core("Widget", 1);
        let c = core("Widget", 2);
        assert_eq!(a.name(), "Widget");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert!(!a.fingerprint().is_null());
    }

    #[test]
    fn subscribe_routes_notifications_between_cores() {
        let upstream = core("Upstream", 1);
        let downstream = core("Downstream", 1);
        upstream.subscribe(&downstream);

        let fired: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));
        {
            let fired = Rc::clone(&fired);
            downstream.set_update_handler(move |_, _| *fired.borrow_mut() += 1);
        }

        upstream.notify_updated(&(), EventTime::zero());
        upstream.notify_updated(&(), EventTime::zero());
        assert_eq!(*fired.borrow(), 2);
        assert!(!upstream.has_updated());
    }

    #[test]
    #[should_panic(expected = "no parameters provided")]
    fn empty_fingerprint_is_rejected() {
        let _ = ObjectCore::<()>::new(Fingerprint::new("Bare"));
    }
}
