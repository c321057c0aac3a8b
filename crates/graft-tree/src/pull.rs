use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

struct PullSlot<E> {
    event: E,
    reads: usize,
}

struct PullInner<E> {
    /// Lifetime count of published events, monotonically increasing.
    published: u64,
    pullers: usize,
    slots: VecDeque<PullSlot<E>>,
}

impl<E> PullInner<E> {
    /// Drop the contiguous prefix of slots that every current puller has
    /// read. With zero pullers the whole buffer is reclaimable.
    fn reclaim(&mut self) {
        while let Some(front) = self.slots.front() {
            if front.reads < self.pullers {
                break;
            }
            self.slots.pop_front();
        }
    }
}

impl<E: Clone> PullInner<E> {
    fn take_from(&mut self, cursor: u64) -> Vec<E> {
        let unread = (self.published - cursor) as usize;
        if unread == 0 {
            return Vec::new();
        }

        let first = self
            .slots
            .len()
            .checked_sub(unread)
            .expect("puller cursor fell behind the retained buffer window");

        let mut events = Vec::with_capacity(unread);
        for slot in self.slots.iter_mut().skip(first) {
            slot.reads += 1;
            events.push(slot.event.clone());
        }

        self.reclaim();
        events
    }
}

/// Producer-owned append-only event log with per-consumer cursors.
///
/// Each consumer registers via [`new_puller`] and drains at its own pace;
/// a slot is retained until every registered puller has read it, then the
/// read-by-all prefix is reclaimed. Publishing with no pullers discards
/// the event outright.
///
/// A puller observes only events published after its creation.
///
/// **Contract:** a puller that is created but never pulled (and never
/// dropped) pins the buffer, which then grows without bound. The buffer
/// does not detect this.
///
/// Single-threaded; `PullBuffer` clones are handles to the same log.
///
/// [`new_puller`]: PullBuffer::new_puller
pub struct PullBuffer<E> {
    inner: Rc<RefCell<PullInner<E>>>,
}

impl<E> Clone for PullBuffer<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for PullBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> PullBuffer<E> {
    /// Create an empty buffer with no pullers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(PullInner {
                published: 0,
                pullers: 0,
                slots: VecDeque::new(),
            })),
        }
    }

    /// Register a new consumer.
    ///
    /// The puller's cursor starts at the current publish count, so it sees
    /// only events published from now on. Dropping the puller unregisters
    /// it and releases any slots it alone was retaining.
    pub fn new_puller(&self) -> EventPuller<E> {
        let mut buffer = self.inner.borrow_mut();
        buffer.pullers += 1;
        EventPuller {
            inner: Rc::clone(&self.inner),
            cursor: buffer.published,
        }
    }

    /// Append an event, or discard it if nobody is pulling.
    pub fn publish(&self, event: E) {
        let mut buffer = self.inner.borrow_mut();
        if buffer.pullers == 0 {
            return;
        }
        buffer.published += 1;
        buffer.slots.push_back(PullSlot { event, reads: 0 });
    }

    /// Number of slots currently retained.
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    /// Returns `true` if no slots are retained.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().slots.is_empty()
    }

    /// Lifetime count of published (non-discarded) events.
    pub fn total_published(&self) -> u64 {
        self.inner.borrow().published
    }

    /// Number of registered pullers.
    pub fn puller_count(&self) -> usize {
        self.inner.borrow().pullers
    }
}

impl<E> fmt::Debug for PullBuffer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.inner.borrow();
        f.debug_struct("PullBuffer")
            .field("retained", &buffer.slots.len())
            .field("published", &buffer.published)
            .field("pullers", &buffer.pullers)
            .finish()
    }
}

/// Cursor into a [`PullBuffer`].
///
/// Cursors only advance forward: no event is delivered twice to the same
/// puller.
pub struct EventPuller<E> {
    inner: Rc<RefCell<PullInner<E>>>,
    cursor: u64,
}

impl<E: Clone> EventPuller<E> {
    /// Drain every event this puller has not yet seen, oldest first.
    pub fn pull(&mut self) -> Vec<E> {
        let events = self.inner.borrow_mut().take_from(self.cursor);
        self.cursor += events.len() as u64;
        events
    }

    /// Drain like [`pull`], but return only the newest payload.
    ///
    /// Marks everything read on the way, so a consumer that only ever cares
    /// about the latest value does not retain the buffer. Returns `None`
    /// when there is nothing unread.
    ///
    /// [`pull`]: EventPuller::pull
    pub fn last(&mut self) -> Option<E> {
        self.pull().pop()
    }
}

impl<E> Drop for EventPuller<E> {
    fn drop(&mut self) {
        let mut buffer = self.inner.borrow_mut();
        buffer.pullers -= 1;
        let before = buffer.slots.len();
        buffer.reclaim();
        if buffer.slots.len() != before {
            debug!(
                released = before - buffer.slots.len(),
                "dropped puller released retained events"
            );
        }
    }
}

impl<E> fmt::Debug for EventPuller<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPuller")
            .field("cursor", &self.cursor)
            .finish()
    }
}
