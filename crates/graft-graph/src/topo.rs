use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use crate::error::GraphError;

/// A directed graph of "depends on" edges, keyed by vertex.
///
/// `insert(a, vec![b, c])` records that `a` depends on `b` and `c`. The
/// graph itself is order-free; determinism comes from the stability list
/// passed to [`stable_topological_order`].
///
/// [`stable_topological_order`]: DependencyGraph::stable_topological_order
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph<K> {
    edges: HashMap<K, Vec<K>>,
}

impl<K> DependencyGraph<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns `true` if `vertex` has been inserted.
    pub fn contains(&self, vertex: &K) -> bool {
        self.edges.contains_key(vertex)
    }

    /// Record a vertex and the full list of vertices it depends on.
    /// Re-inserting a vertex replaces its edge list.
    pub fn insert(&mut self, vertex: K, depends_on: Vec<K>) {
        self.edges.insert(vertex, depends_on);
    }

    /// The recorded dependencies of `vertex`, if present.
    pub fn dependencies_of(&self, vertex: &K) -> Option<&[K]> {
        self.edges.get(vertex).map(Vec::as_slice)
    }

    /// Produce a linear order in which every vertex appears before all
    /// vertices reachable from it through "depends on" edges.
    ///
    /// Kahn's algorithm, seeded and consumed in `stability` order: the
    /// ready queue is filled by scanning the stability list, processed
    /// FIFO, and neighbors are relaxed in edge-list order. Two runs over
    /// the same graph and stability list produce identical output.
    ///
    /// Note the direction: dependents come *first*. Callers that need
    /// dependencies-first (initialization) reverse the result.
    pub fn stable_topological_order(&self, stability: &[K]) -> Result<Vec<K>, GraphError<K>> {
        if stability.len() != self.edges.len() {
            return Err(GraphError::StabilityMismatch {
                vertices: self.edges.len(),
                stability: stability.len(),
            });
        }

        let mut in_degree: HashMap<&K, usize> = HashMap::new();
        for vertex in stability {
            if let Some(deps) = self.edges.get(vertex) {
                for dep in deps {
                    *in_degree.entry(dep).or_insert(0) += 1;
                }
            }
        }

        let mut queue: VecDeque<&K> = stability
            .iter()
            .filter(|vertex| in_degree.get(*vertex).copied().unwrap_or(0) == 0)
            .collect();

        let mut result = Vec::with_capacity(self.edges.len());
        while let Some(vertex) = queue.pop_front() {
            result.push(vertex.clone());

            if let Some(deps) = self.edges.get(vertex) {
                for dep in deps {
                    if let Some(degree) = in_degree.get_mut(dep) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dep);
                        }
                    }
                }
            }
        }

        if result.len() != self.edges.len() {
            return Err(GraphError::Cycle {
                partial: result,
                vertices: self.edges.len(),
            });
        }

        Ok(result)
    }
}
