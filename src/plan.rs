//! The executable plan: the compiler's read-only output.
//!
//! Created once per run, consumed by the executor, then discarded. All
//! topology questions (successors, predecessors, entry) are answered here;
//! the executor never looks at the original [`GraphSpec`](crate::spec::GraphSpec).

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::handler::Handler;

/// Reserved id of the terminal sink: the implicit node meaning "no further
/// work". Declared nodes may not use it; the compiler injects edges to it for
/// every dangling node so acyclic plans always terminate.
pub const END: &str = "__end__";

/// Compiled topology plus resolved handlers for a single run.
#[derive(Clone)]
pub struct ExecutablePlan {
    entry: String,
    adjacency: FxHashMap<String, Vec<String>>,
    predecessors: FxHashMap<String, Vec<String>>,
    handlers: FxHashMap<String, Arc<dyn Handler>>,
}

impl ExecutablePlan {
    pub(crate) fn new(
        entry: String,
        adjacency: FxHashMap<String, Vec<String>>,
        predecessors: FxHashMap<String, Vec<String>>,
        handlers: FxHashMap<String, Arc<dyn Handler>>,
    ) -> Self {
        Self {
            entry,
            adjacency,
            predecessors,
            handlers,
        }
    }

    /// Id of the resolved entry node.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Successors of a node, including the terminal sink where injected.
    #[must_use]
    pub fn successors(&self, node: &str) -> &[String] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Declared predecessors of a node (by incoming edge).
    #[must_use]
    pub fn predecessors(&self, node: &str) -> &[String] {
        self.predecessors.get(node).map_or(&[], Vec::as_slice)
    }

    /// The resolved handler for a node id.
    #[must_use]
    pub fn handler(&self, node: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(node)
    }

    /// All declared node ids, in lexical order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for ExecutablePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutablePlan")
            .field("entry", &self.entry)
            .field("nodes", &self.node_ids())
            .field("adjacency", &self.adjacency)
            .finish_non_exhaustive()
    }
}
