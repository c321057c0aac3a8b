use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use graft_graph::{DependencyGraph, GraphError};
use graft_types::{ContentHash, ObjectKey};

use crate::error::StoreError;
use crate::object::SharedObject;
use crate::slot::SharedRef;

/// Type-erased handle to a canonical object, as held by the store.
pub type DynSharedObject<C, P> = Rc<RefCell<dyn SharedObject<C, P>>>;

/// How initialization-order ties are broken between unrelated objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StabilityPolicy {
    /// Sort object keys. Deterministic across runs; the default.
    #[default]
    SortedKeys,
    /// First registered wins. Deterministic only if the embedder registers
    /// in a fixed order.
    RegistrationOrder,
}

/// Lifecycle phase of a store. Transitions are forward-only, each driven
/// by exactly one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    Empty,
    Registered,
    Initialized,
    Started,
    Stopped,
    Closed,
}

struct StoreEntry<C: 'static, P: 'static> {
    object: DynSharedObject<C, P>,
    /// The same cell, kept as `Any` so a typed registration site can
    /// recover the concrete type.
    as_any: Rc<dyn Any>,
    type_tag: &'static str,
}

/// Deduplicating registry and lifecycle scheduler for shared objects.
///
/// `C` is the update-propagation context type, `P` the parameter bundle
/// passed to `init` and `start`. One store instance is confined to one
/// thread.
pub struct SharedStore<C: 'static, P: 'static> {
    objects: HashMap<ObjectKey, StoreEntry<C, P>>,
    registration_order: Vec<ObjectKey>,

    /// Scratch list of dependencies registered since it was last drained;
    /// consumed by dependency collection during `init`.
    pending: Vec<ObjectKey>,
    /// Snapshot of `pending` at the moment `init` was called.
    top_level: Vec<ObjectKey>,
    /// Every registration since the last `recently_registered` call,
    /// including hits on already-canonical objects.
    recently_registered: Vec<ObjectKey>,

    init_order: Vec<ObjectKey>,
    params: Option<P>,
    stability: StabilityPolicy,
    phase: LifecyclePhase,
}

impl<C: 'static, P: 'static> Default for SharedStore<C, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static, P: 'static> SharedStore<C, P> {
    /// Create an empty store with the [`StabilityPolicy::SortedKeys`]
    /// tie-break.
    pub fn new() -> Self {
        Self::with_stability(StabilityPolicy::default())
    }

    /// Create an empty store with an explicit stability policy.
    pub fn with_stability(stability: StabilityPolicy) -> Self {
        Self {
            objects: HashMap::new(),
            registration_order: Vec::new(),
            pending: Vec::new(),
            top_level: Vec::new(),
            recently_registered: Vec::new(),
            init_order: Vec::new(),
            params: None,
            stability,
            phase: LifecyclePhase::Empty,
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register the object in `slot` to be shared with other consumers.
    ///
    /// If no object with the same key exists, the slot's value is adopted
    /// as the canonical instance. Otherwise the slot is overwritten with
    /// the existing canonical instance and the caller's freshly built
    /// duplicate is released when its last handle drops.
    ///
    /// # Panics
    ///
    /// - if the object's fingerprint is the null hash;
    /// - if an object with the same key exists but has a different
    ///   concrete type. The key's type tag is the best-effort readable
    ///   `type_name`, which distinct types can in principle share; the
    ///   `Any`-downcast here is the authoritative check.
    pub fn register<T: SharedObject<C, P>>(&mut self, slot: &mut SharedRef<T>) {
        let key = {
            let object = slot.borrow();
            let hash = *object.fingerprint();
            assert!(
                !hash.is_null(),
                "cannot register shared object {:?}: fingerprint hash is null",
                object.name()
            );
            ObjectKey::of::<T>(hash)
        };

        if !self.pending.contains(&key) {
            self.pending.push(key.clone());
        }
        self.recently_registered.push(key.clone());

        if let Some(existing) = self.objects.get(&key) {
            match Rc::clone(&existing.as_any).downcast::<RefCell<T>>() {
                Ok(canonical) => {
                    debug!(%key, "redirecting registration to canonical instance");
                    *slot = SharedRef::from_rc(canonical);
                }
                Err(_) => panic!(
                    "object {key} is already registered with a different type: \
                     existing {}, registering {}",
                    existing.type_tag,
                    type_name::<T>()
                ),
            }
            return;
        }

        debug!(%key, "adopting shared object");
        let rc = Rc::clone(slot.rc());
        let object: DynSharedObject<C, P> = rc.clone();
        let as_any: Rc<dyn Any> = rc;
        self.objects.insert(
            key.clone(),
            StoreEntry {
                object,
                as_any,
                type_tag: type_name::<T>(),
            },
        );
        self.registration_order.push(key);
        if self.phase == LifecyclePhase::Empty {
            self.phase = LifecyclePhase::Registered;
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Gather the dependency DAG and initialize every object,
    /// dependencies first.
    ///
    /// Objects registered so far become the top-level dependencies; each
    /// object is then asked to register its own requirements, recursively,
    /// until the graph is closed. The initialization order is the reversed
    /// stable topological order of that graph and is reused by `start`,
    /// `stop` and `close`.
    ///
    /// On an object `init` failure the walk stops; objects later in the
    /// order are not touched, and `stop`/`close` will not visit anything.
    pub fn init(&mut self, params: P) -> Result<(), StoreError> {
        if !matches!(
            self.phase,
            LifecyclePhase::Empty | LifecyclePhase::Registered
        ) {
            return Err(StoreError::AlreadyInitialized);
        }

        self.top_level = self.pending.clone();
        let mut graph = DependencyGraph::new();
        self.collect_dependencies(&mut graph);
        assert!(
            graph.len() == self.objects.len(),
            "failed to collect dependencies of every shared object: {} of {}",
            graph.len(),
            self.objects.len()
        );

        let stability: Vec<ObjectKey> = match self.stability {
            StabilityPolicy::SortedKeys => {
                let mut keys: Vec<ObjectKey> = self.objects.keys().cloned().collect();
                keys.sort();
                keys
            }
            StabilityPolicy::RegistrationOrder => self.registration_order.clone(),
        };

        let mut order = match graph.stable_topological_order(&stability) {
            Ok(order) => order,
            Err(GraphError::Cycle { partial, .. }) => {
                return Err(StoreError::CyclicDependencies { partial });
            }
            Err(err @ GraphError::StabilityMismatch { .. }) => {
                panic!("stability list diverged from the collected graph: {err}")
            }
        };
        // The sorter puts dependents first; initialization wants
        // dependencies first.
        order.reverse();
        debug!(objects = order.len(), "initializing shared objects");

        for key in &order {
            let object = Rc::clone(&self.objects[key].object);
            debug!(%key, "initializing shared object");
            object
                .borrow_mut()
                .init(&params)
                .map_err(|source| StoreError::ObjectInit {
                    key: key.clone(),
                    source,
                })?;
        }

        self.init_order = order;
        self.params = Some(params);
        self.phase = LifecyclePhase::Initialized;
        Ok(())
    }

    /// Drain the pending list and ask each unprocessed object for its
    /// requirements, recording its direct dependencies as they were
    /// observed right after its own `register_dependencies` call.
    fn collect_dependencies(&mut self, graph: &mut DependencyGraph<ObjectKey>) {
        let pending = std::mem::take(&mut self.pending);

        for key in pending {
            if graph.contains(&key) {
                continue;
            }
            let object = Rc::clone(&self.objects[&key].object);
            debug!(%key, "gathering shared object requirements");
            object.borrow_mut().register_dependencies(self);

            graph.insert(key, self.pending.clone());
            self.collect_dependencies(graph);
        }
    }

    /// Invoke `start` on every object, in initialization order.
    pub fn start(&mut self) -> Result<(), StoreError> {
        if self.init_order.is_empty() {
            if !self.objects.is_empty() {
                return Err(StoreError::NotInitialized);
            }
            self.phase = LifecyclePhase::Started;
            return Ok(());
        }

        let params = self
            .params
            .as_ref()
            .expect("initialization order recorded without params");
        for key in &self.init_order {
            let object = Rc::clone(&self.objects[key].object);
            debug!(%key, "starting shared object");
            object
                .borrow_mut()
                .start(params)
                .map_err(|source| StoreError::ObjectStart {
                    key: key.clone(),
                    source,
                })?;
        }

        self.phase = LifecyclePhase::Started;
        Ok(())
    }

    /// Invoke `stop` on every object, in reverse initialization order.
    /// Infallible; a store whose `init` failed has nothing to stop.
    pub fn stop(&mut self) {
        for key in self.init_order.iter().rev() {
            let object = Rc::clone(&self.objects[key].object);
            debug!(%key, "stopping shared object");
            object.borrow_mut().stop();
        }
        self.phase = LifecyclePhase::Stopped;
    }

    /// Invoke `close` on every object, in reverse initialization order.
    /// Infallible.
    pub fn close(&mut self) {
        for key in self.init_order.iter().rev() {
            let object = Rc::clone(&self.objects[key].object);
            debug!(%key, "closing shared object");
            object.borrow_mut().close();
        }
        self.phase = LifecyclePhase::Closed;
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Look up a canonical object by key.
    pub fn get(&self, key: &ObjectKey) -> Option<DynSharedObject<C, P>> {
        self.objects.get(key).map(|entry| Rc::clone(&entry.object))
    }

    /// Look up a canonical object by concrete type and fingerprint.
    pub fn get_typed<T: SharedObject<C, P>>(&self, hash: &ContentHash) -> Option<SharedRef<T>> {
        let key = ObjectKey::of::<T>(*hash);
        let entry = self.objects.get(&key)?;
        let rc = Rc::clone(&entry.as_any).downcast::<RefCell<T>>().ok()?;
        Some(SharedRef::from_rc(rc))
    }

    /// The objects that were registered directly, before `init` was
    /// called (as opposed to those discovered transitively).
    pub fn top_level_dependencies(&self) -> &[ObjectKey] {
        &self.top_level
    }

    /// Every registration since the last call of this method, including
    /// registrations that hit an already-canonical object. Reset on read.
    ///
    /// Middleware can use this to observe what a child registered without
    /// knowing what it does.
    pub fn recently_registered(&mut self) -> Vec<ObjectKey> {
        std::mem::take(&mut self.recently_registered)
    }

    /// Number of canonical objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns `true` if an object with this key is registered.
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    /// The store's current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }
}

impl<C: 'static, P: 'static> std::fmt::Debug for SharedStore<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("objects", &self.objects.len())
            .field("phase", &self.phase)
            .finish()
    }
}
