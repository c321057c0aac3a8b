use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use graft_graph::DependencyGraph;
use graft_types::EventTime;

/// Callback invoked when one or more of a node's subscriptions have
/// notified during the current propagation pass.
///
/// The context and stamp are forwarded verbatim from the originating
/// `notify_updated` call; the tree attaches no semantics to either.
pub type UpdateHandler<C> = Box<dyn FnMut(&C, EventTime)>;

/// Process-unique identifier for an update node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct NodeInner<C> {
    id: NodeId,
    name: String,

    /// Downstream nodes, in subscription order.
    subscribers: RefCell<Vec<UpdateNode<C>>>,
    /// Upstream back-references. Weak: ownership flows downstream only.
    subscriptions: RefCell<Vec<Weak<NodeInner<C>>>>,

    handler: RefCell<Option<UpdateHandler<C>>>,

    /// Propagation order of the transitive downstream set, computed on the
    /// first pass rooted here and reused for every later pass.
    cached_order: RefCell<Option<Rc<Vec<UpdateNode<C>>>>>,

    /// Transient per-pass flags.
    updated: Cell<bool>,
    subscription_updated: Cell<bool>,
}

/// A vertex of the update propagation tree.
///
/// `UpdateNode` is a cheap handle: clones share the same vertex. A node
/// subscribes downstream consumers with [`subscribe`], receives an optional
/// [`UpdateHandler`], and propagates with [`notify_updated`].
///
/// # Subscription window
///
/// The propagation order below a root is captured on the **first**
/// notification from that root and is never invalidated. Subscriptions
/// added afterwards are silently excluded from that root's passes: complete
/// all subscriptions before the first event is sent.
///
/// [`subscribe`]: UpdateNode::subscribe
/// [`notify_updated`]: UpdateNode::notify_updated
pub struct UpdateNode<C> {
    inner: Rc<NodeInner<C>>,
}

impl<C> Clone for UpdateNode<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C> UpdateNode<C> {
    /// Create a node with a debug name and no handler.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                id: NodeId::next(),
                name: name.into(),
                subscribers: RefCell::new(Vec::new()),
                subscriptions: RefCell::new(Vec::new()),
                handler: RefCell::new(None),
                cached_order: RefCell::new(None),
                updated: Cell::new(false),
                subscription_updated: Cell::new(false),
            }),
        }
    }

    /// The node's process-unique ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// The node's debug name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` if `self` and `other` are handles to the same vertex.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register `downstream` to be notified whenever this node updates.
    ///
    /// Records the forward edge and a weak back-edge. Must be called before
    /// the first propagation from any root that should observe the edge;
    /// see the type-level note on the subscription window.
    pub fn subscribe(&self, downstream: &UpdateNode<C>) {
        debug!(node = %self, subscriber = %downstream, "subscribing update node");
        self.inner.subscribers.borrow_mut().push(downstream.clone());
        downstream
            .inner
            .subscriptions
            .borrow_mut()
            .push(Rc::downgrade(&self.inner));
    }

    /// Install the callback invoked when any subscription notified during
    /// a propagation pass. Replaces any previous handler.
    pub fn set_update_handler(&self, handler: impl FnMut(&C, EventTime) + 'static) {
        *self.inner.handler.borrow_mut() = Some(Box::new(handler));
    }

    /// Number of direct downstream subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Number of upstream subscriptions still alive.
    pub fn subscription_count(&self) -> usize {
        self.inner
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    /// Transient introspection: `true` while this node's own update is in
    /// flight within the current pass. A handler can probe its upstream
    /// objects with this to learn which of them contributed.
    pub fn has_updated(&self) -> bool {
        self.inner.updated.get()
    }

    /// Signal that this node has updated.
    ///
    /// If the call originates inside a running pass (an upstream already
    /// notified this node), it only marks flags: the running pass will
    /// reach this node's downstream set in topological position. Otherwise
    /// this node becomes the root of a new pass: its cached propagation
    /// order is computed if absent, then swept — every node whose
    /// subscriptions notified has its handler invoked exactly once, in
    /// DAG-consistent order, before the transient flags are cleared.
    pub fn notify_updated(&self, ctx: &C, at: EventTime) {
        self.inner.updated.set(true);

        for subscriber in self.inner.subscribers.borrow().iter() {
            subscriber.inner.subscription_updated.set(true);
        }

        if self.inner.subscription_updated.get() {
            // Inside a parent pass; the running sweep will visit us.
            return;
        }

        self.run_pass(ctx, at);
    }

    fn run_pass(&self, ctx: &C, at: EventTime) {
        let order = self.propagation_order();

        for node in order.iter() {
            if node.inner.subscription_updated.get() {
                node.invoke_handler(ctx, at);
            }
            node.inner.subscription_updated.set(false);
        }

        for node in order.iter() {
            node.inner.updated.set(false);
        }
    }

    fn invoke_handler(&self, ctx: &C, at: EventTime) {
        let mut slot = self.inner.handler.try_borrow_mut().unwrap_or_else(|_| {
            panic!("re-entrant handler invocation on update node {self}: the subscription graph routes a notification back into a handler that is still running")
        });
        if let Some(handler) = slot.as_mut() {
            handler(ctx, at);
        }
    }

    /// The cached propagation order rooted at this node, computing it on
    /// first use.
    fn propagation_order(&self) -> Rc<Vec<UpdateNode<C>>> {
        if let Some(order) = self.inner.cached_order.borrow().as_ref() {
            return Rc::clone(order);
        }

        let order = Rc::new(self.compute_order());
        debug!(root = %self, nodes = order.len(), "caching propagation order");
        *self.inner.cached_order.borrow_mut() = Some(Rc::clone(&order));
        order
    }

    fn compute_order(&self) -> Vec<UpdateNode<C>> {
        let mut walk = Vec::new();
        let mut index: HashMap<NodeId, UpdateNode<C>> = HashMap::new();
        self.collect_downstream(&mut walk, &mut index);

        let stability: Vec<NodeId> = walk.iter().map(UpdateNode::id).collect();
        let mut graph = DependencyGraph::new();
        for node in &walk {
            let subscriber_ids: Vec<NodeId> = node
                .inner
                .subscribers
                .borrow()
                .iter()
                .map(UpdateNode::id)
                .collect();
            graph.insert(node.id(), subscriber_ids);
        }

        let sorted = graph
            .stable_topological_order(&stability)
            .unwrap_or_else(|e| panic!("cyclic subscription graph below node {self}: {e}"));

        sorted.into_iter().map(|id| index[&id].clone()).collect()
    }

    /// Pre-order walk of the transitive downstream set, first occurrence
    /// wins. The walk order doubles as the stability list for tie-breaking.
    fn collect_downstream(
        &self,
        walk: &mut Vec<UpdateNode<C>>,
        index: &mut HashMap<NodeId, UpdateNode<C>>,
    ) {
        if index.contains_key(&self.id()) {
            return;
        }
        index.insert(self.id(), self.clone());
        walk.push(self.clone());

        let subscribers = self.inner.subscribers.borrow().clone();
        for subscriber in subscribers {
            subscriber.collect_downstream(walk, index);
        }
    }
}

impl<C> fmt::Display for UpdateNode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.inner.name, self.inner.id.raw())
    }
}

impl<C> fmt::Debug for UpdateNode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateNode")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;
    type Flag = Rc<Cell<bool>>;

    /// A node whose handler logs its name and re-notifies, mirroring an
    /// object that processes an update and propagates further. When
    /// `excluded` and the `partial` flag is set, the handler does nothing,
    /// simulating a node that has no output for this event.
    fn relay(name: &'static str, log: &Log, partial: &Flag, excluded: bool) -> UpdateNode<()> {
        let node = UpdateNode::new(name);
        let this = node.clone();
        let log = Rc::clone(log);
        let partial = Rc::clone(partial);
        node.set_update_handler(move |ctx, at| {
            if !partial.get() || !excluded {
                log.borrow_mut().push(name);
                assert!(!this.has_updated());
                this.notify_updated(ctx, at);
                assert!(this.has_updated());
            }
        });
        node
    }

    /// A terminal node that only logs.
    fn sink(name: &'static str, log: &Log) -> UpdateNode<()> {
        let node = UpdateNode::new(name);
        let log = Rc::clone(log);
        node.set_update_handler(move |_, _| log.borrow_mut().push(name));
        node
    }

    struct Fan {
        f: UpdateNode<()>,
        e1: UpdateNode<()>,
        e2: UpdateNode<()>,
        nodes: Vec<UpdateNode<()>>,
        log: Log,
        partial: Flag,
    }

    /// The double-diamond fixture:
    ///
    /// ```text
    /// f -> e1 -> {d1, c1, b1};  d1 -> b1;  c1 -> b1;  b1 -> a
    /// f -> e2 -> {b2, c2, d2};  d2 -> b2;  c2 -> b2;  b2 -> a
    /// ```
    fn fan() -> Fan {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let partial: Flag = Rc::new(Cell::new(false));

        let f = UpdateNode::new("f");

        let e1 = relay("e1", &log, &partial, false);
        let d1 = relay("d1", &log, &partial, false);
        let c1 = relay("c1", &log, &partial, true);
        let b1 = relay("b1", &log, &partial, false);

        let e2 = relay("e2", &log, &partial, true);
        let d2 = relay("d2", &log, &partial, false);
        let c2 = relay("c2", &log, &partial, true);
        let b2 = relay("b2", &log, &partial, false);

        let a = sink("a", &log);

        f.subscribe(&e1);
        e1.subscribe(&d1);
        e1.subscribe(&c1);
        e1.subscribe(&b1);
        d1.subscribe(&b1);
        c1.subscribe(&b1);
        b1.subscribe(&a);

        f.subscribe(&e2);
        e2.subscribe(&b2);
        e2.subscribe(&c2);
        e2.subscribe(&d2);
        d2.subscribe(&b2);
        c2.subscribe(&b2);
        b2.subscribe(&a);

        let nodes = vec![
            f.clone(),
            e1.clone(),
            e2.clone(),
            d1,
            d2,
            c1,
            c2,
            b1,
            b2,
            a,
        ];
        Fan {
            f,
            e1,
            e2,
            nodes,
            log,
            partial,
        }
    }

    impl Fan {
        fn fire(&self, root: &UpdateNode<()>, seed: &'static str) -> Vec<&'static str> {
            self.log.borrow_mut().clear();
            self.log.borrow_mut().push(seed);
            assert!(!root.has_updated());
            root.notify_updated(&(), EventTime::zero());
            assert!(!root.has_updated());
            self.log.borrow().clone()
        }

        fn assert_all_clear(&self) {
            for node in &self.nodes {
                assert!(!node.has_updated(), "{node} still marked updated");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Propagation order
    // -----------------------------------------------------------------------

    #[test]
    fn pass_from_inner_root_is_dag_ordered() {
        let fan = fan();
        assert_eq!(
            fan.fire(&fan.e1, "e1"),
            vec!["e1", "d1", "c1", "b1", "a"]
        );
        fan.assert_all_clear();
    }

    #[test]
    fn pass_respects_subscription_order_per_node() {
        let fan = fan();
        // e2 subscribed its children in the order b2, c2, d2; b2 still
        // fires last because both c2 and d2 point at it.
        assert_eq!(
            fan.fire(&fan.e2, "e2"),
            vec!["e2", "c2", "d2", "b2", "a"]
        );
        fan.assert_all_clear();
    }

    #[test]
    fn pass_from_top_root_covers_both_diamonds() {
        let fan = fan();
        assert_eq!(
            fan.fire(&fan.f, "f"),
            vec!["f", "e1", "e2", "d1", "c1", "c2", "d2", "b1", "b2", "a"]
        );
        fan.assert_all_clear();
    }

    #[test]
    fn repeated_passes_reuse_cached_order() {
        let fan = fan();
        let first = fan.fire(&fan.f, "f");
        let second = fan.fire(&fan.f, "f");
        assert_eq!(first, second);

        // Interleaving roots does not disturb each other's cached orders.
        let e1_order = fan.fire(&fan.e1, "e1");
        assert_eq!(fan.fire(&fan.f, "f"), first);
        assert_eq!(fan.fire(&fan.e1, "e1"), e1_order);
        fan.assert_all_clear();
    }

    // -----------------------------------------------------------------------
    // Re-entrancy coalescing
    // -----------------------------------------------------------------------

    #[test]
    fn partial_participation_still_fires_downstream_once() {
        let fan = fan();
        fan.partial.set(true);

        // c1 stays silent, but b1 still fires exactly once, after d1.
        assert_eq!(fan.fire(&fan.e1, "e1"), vec!["e1", "d1", "b1", "a"]);
        assert_eq!(fan.fire(&fan.e2, "e2"), vec!["e2", "d2", "b2", "a"]);
        assert_eq!(
            fan.fire(&fan.f, "f"),
            vec!["f", "e1", "d1", "b1", "a"]
        );
        fan.assert_all_clear();
    }

    #[test]
    fn nested_notification_does_not_start_inner_pass() {
        // x -> y -> z, where y's handler re-notifies. z must fire once,
        // after y, within the pass rooted at x.
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let partial: Flag = Rc::new(Cell::new(false));
        let x = UpdateNode::new("x");
        let y = relay("y", &log, &partial, false);
        let z = sink("z", &log);
        x.subscribe(&y);
        y.subscribe(&z);

        x.notify_updated(&(), EventTime::zero());
        assert_eq!(*log.borrow(), vec!["y", "z"]);
    }

    // -----------------------------------------------------------------------
    // Subscription window
    // -----------------------------------------------------------------------

    #[test]
    fn subscription_after_first_pass_is_not_observed() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let root = UpdateNode::new("root");
        let early = sink("early", &log);
        root.subscribe(&early);

        root.notify_updated(&(), EventTime::zero());
        assert_eq!(*log.borrow(), vec!["early"]);

        // Subscribed after the first event: excluded from this root's order.
        let late = sink("late", &log);
        root.subscribe(&late);

        log.borrow_mut().clear();
        root.notify_updated(&(), EventTime::zero());
        assert_eq!(*log.borrow(), vec!["early"]);
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    #[test]
    fn handler_sees_which_upstream_updated() {
        let left = UpdateNode::new("left");
        let right = UpdateNode::new("right");
        let joint = UpdateNode::new("joint");
        left.subscribe(&joint);
        right.subscribe(&joint);

        let seen: Rc<RefCell<Vec<(bool, bool)>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let left = left.clone();
            let right = right.clone();
            let seen = Rc::clone(&seen);
            joint.set_update_handler(move |_, _| {
                seen.borrow_mut()
                    .push((left.has_updated(), right.has_updated()));
            });
        }

        left.notify_updated(&(), EventTime::zero());
        right.notify_updated(&(), EventTime::zero());
        assert_eq!(*seen.borrow(), vec![(true, false), (false, true)]);

        // Flags are transient: cleared once each pass has completed.
        assert!(!left.has_updated());
        assert!(!right.has_updated());
    }

    #[test]
    fn counts_and_identity() {
        let a = UpdateNode::<()>::new("a");
        let b = UpdateNode::<()>::new("b");
        a.subscribe(&b);

        assert_eq!(a.subscriber_count(), 1);
        assert_eq!(b.subscription_count(), 1);
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), "a");
    }

    #[test]
    fn notification_without_subscribers_or_handler_is_inert() {
        let lone = UpdateNode::<()>::new("lone");
        lone.notify_updated(&(), EventTime::zero());
        assert!(!lone.has_updated());
    }
}
