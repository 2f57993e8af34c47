//! Graph spec types: the declarative shape a visual editor submits for a run.
//!
//! A [`GraphSpec`] is plain data. It is not validated on construction; the
//! compiler checks structure (dangling endpoints, duplicate ids, cycles)
//! before anything executes. Declaration order of nodes is significant: it is
//! the tie-break for entry-point resolution.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form configuration attached to a node by the editor.
///
/// The core never interprets the contents; it hands the map to the handler
/// factory for the node's type.
pub type ConfigMap = FxHashMap<String, Value>;

/// A single unit of work in the workflow, as declared by the editor.
///
/// Identified only by `id`; `kind` (serialized as `"type"`) selects a handler
/// through the [`HandlerRegistry`](crate::registry::HandlerRegistry).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique identifier within the graph.
    pub id: String,
    /// Node type string, e.g. `"chat-trigger"` or `"agent-brain"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Handler configuration; opaque to the core.
    #[serde(default)]
    pub config: ConfigMap,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            config: ConfigMap::default(),
        }
    }

    /// Attach one configuration entry, builder-style.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// A directed dependency from `source` to `target`.
///
/// Multiple edges may share a source (fan-out) or a target (fan-in).
/// Self-loops are rejected at compile time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// The full graph submitted for a single run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl GraphSpec {
    pub fn new(nodes: Vec<NodeSpec>, edges: Vec<EdgeSpec>) -> Self {
        Self { nodes, edges }
    }

    /// Look up a declared node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
