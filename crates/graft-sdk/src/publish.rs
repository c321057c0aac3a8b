use std::fmt;

use graft_hash::Fingerprint;
use graft_tree::{EventPuller, PullBuffer, UpdateNode};
use graft_types::{ContentHash, EventTime};

use crate::object::ObjectCore;

/// An [`ObjectCore`] composed with a pull-model event buffer.
///
/// For objects that do not just signal "something changed" but carry a
/// payload: [`publish_event`] appends the payload to the buffer and then
/// notifies the update tree, so each subscriber can pull the events it has
/// not seen when its handler runs.
///
/// Remember the pull-buffer contract: every puller handed out by
/// [`new_puller`] must actually pull (or be dropped), or the buffer grows
/// without bound.
///
/// [`publish_event`]: PublishingCore::publish_event
/// [`new_puller`]: PublishingCore::new_puller
pub struct PublishingCore<C: 'static, E> {
    core: ObjectCore<C>,
    events: PullBuffer<E>,
}

impl<C: 'static, E: Clone> PublishingCore<C, E> {
    /// Build a publishing core from a fingerprint.
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self {
            core: ObjectCore::new(fingerprint),
            events: PullBuffer::new(),
        }
    }

    /// The embedded plain core.
    pub fn core(&self) -> &ObjectCore<C> {
        &self.core
    }

    /// The underlying event buffer.
    pub fn events(&self) -> &PullBuffer<E> {
        &self.events
    }

    /// Register a consumer for this object's events.
    pub fn new_puller(&self) -> EventPuller<E> {
        self.events.new_puller()
    }

    /// Publish a payload, then notify subscribers.
    pub fn publish_event(&self, ctx: &C, at: EventTime, event: E) {
        self.events.publish(event);
        self.core.notify_updated(ctx, at);
    }

    // Delegation of the core surface, so publishing objects read the same
    // as plain ones.

    /// See [`ObjectCore::name`].
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// See [`ObjectCore::fingerprint`].
    pub fn fingerprint(&self) -> &ContentHash {
        self.core.fingerprint()
    }

    /// See [`ObjectCore::update_node`].
    pub fn update_node(&self) -> &UpdateNode<C> {
        self.core.update_node()
    }

    /// See [`ObjectCore::subscribe`].
    pub fn subscribe(&self, downstream: &ObjectCore<C>) {
        self.core.subscribe(downstream);
    }

    /// See [`ObjectCore::set_update_handler`].
    pub fn set_update_handler(&self, handler: impl FnMut(&C, EventTime) + 'static) {
        self.core.set_update_handler(handler);
    }

    /// See [`ObjectCore::notify_updated`].
    pub fn notify_updated(&self, ctx: &C, at: EventTime) {
        self.core.notify_updated(ctx, at);
    }

    /// See [`ObjectCore::has_updated`].
    pub fn has_updated(&self) -> bool {
        self.core.has_updated()
    }
}

impl<C: 'static, E> fmt::Debug for PublishingCore<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishingCore")
            .field("name", &self.core.name())
            .field("buffered", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_event_buffers_then_notifies() {
        let publisher: PublishingCore<(), i32> =
            PublishingCore::new(Fingerprint::new("Publisher").field(&1));
        let consumer = ObjectCore::new(Fingerprint::new("Consumer").field(&1));
        publisher.subscribe(&consumer);

        let puller = Rc::new(RefCell::new(publisher.new_puller()));
        let seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let puller = Rc::clone(&puller);
            let seen = Rc::clone(&seen);
            consumer.set_update_handler(move |_, _| {
                seen.borrow_mut().extend(puller.borrow_mut().pull());
            });
        }

        publisher.publish_event(&(), EventTime::zero(), 7);
        publisher.publish_event(&(), EventTime::zero(), 8);

        // The handler drained each event in its own pass; nothing retained.
        assert_eq!(*seen.borrow(), vec![7, 8]);
        assert_eq!(publisher.events().len(), 0);
    }

    #[test]
    fn publish_without_pullers_still_notifies() {
        let publisher: PublishingCore<(), i32> =
            PublishingCore::new(Fingerprint::new("Publisher").field(&2));
        let consumer = ObjectCore::new(Fingerprint::new("Consumer").field(&2));
        publisher.subscribe(&consumer);

        let fired: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));
        {
            let fired = Rc::clone(&fired);
            consumer.set_update_handler(move |_, _| *fired.borrow_mut() += 1);
        }

        publisher.publish_event(&(), EventTime::zero(), 1);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(publisher.events().len(), 0);
    }
}
