//! Graph compilation: validation, entry resolution, terminal-edge injection,
//! and adjacency building.
//!
//! Everything here runs before a single handler executes; a graph that fails
//! to compile has no partial side effects. The compiled output is an
//! [`ExecutablePlan`].

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::handler::Handler;
use crate::plan::{ExecutablePlan, END};
use crate::registry::HandlerRegistry;
use crate::spec::GraphSpec;

/// Default entry-point priority over node types, highest first. An explicit
/// chat trigger outranks a generic trigger, which outranks an input channel;
/// a graph declaring none of these starts at its first declared node.
pub const DEFAULT_ENTRY_PRIORITY: [&str; 3] = ["chat-trigger", "trigger", "input-channel"];

/// Compile-time failures. All are fatal and reported before any execution.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CompileError {
    /// Structural defect: dangling edge endpoint, duplicate or reserved id,
    /// self-loop, or an empty graph.
    #[error("invalid graph: {reason}")]
    #[diagnostic(
        code(canvasflow::compiler::invalid_graph),
        help("Fix the graph in the editor; node ids must be unique and every edge endpoint must name a declared node.")
    )]
    InvalidGraph { reason: String },

    /// No starting node could be resolved (only possible for an empty node
    /// set, which `validate` already rejects).
    #[error("no entry point: the graph has no nodes")]
    #[diagnostic(code(canvasflow::compiler::no_entry_point))]
    NoEntryPoint,

    /// The plan is not acyclic under this engine's execution model.
    #[error("cycle detected through node `{node}`")]
    #[diagnostic(
        code(canvasflow::compiler::cycle_detected),
        help("This engine runs acyclic plans only; remove the back edge or restructure the loop.")
    )]
    CycleDetected { node: String },
}

/// Turns a [`GraphSpec`] plus a [`HandlerRegistry`] into an [`ExecutablePlan`].
#[derive(Clone, Debug)]
pub struct Compiler {
    entry_priority: Vec<String>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            entry_priority: DEFAULT_ENTRY_PRIORITY
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the trigger-type priority order used by entry resolution.
    #[must_use]
    pub fn with_entry_priority(mut self, priority: Vec<String>) -> Self {
        self.entry_priority = priority;
        self
    }

    /// Structural validation: non-empty node set, unique non-reserved ids,
    /// resolvable edge endpoints, no self-loops.
    pub fn validate(&self, spec: &GraphSpec) -> Result<(), CompileError> {
        if spec.nodes.is_empty() {
            return Err(CompileError::InvalidGraph {
                reason: "graph has no nodes".to_string(),
            });
        }

        let mut ids: FxHashSet<&str> = FxHashSet::default();
        for node in &spec.nodes {
            if node.id == END {
                return Err(CompileError::InvalidGraph {
                    reason: format!("node id `{END}` is reserved for the terminal sink"),
                });
            }
            if !ids.insert(node.id.as_str()) {
                return Err(CompileError::InvalidGraph {
                    reason: format!("duplicate node id `{}`", node.id),
                });
            }
        }

        for edge in &spec.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(CompileError::InvalidGraph {
                        reason: format!(
                            "edge {} -> {} references unknown node id `{endpoint}`",
                            edge.source, edge.target
                        ),
                    });
                }
            }
            if edge.source == edge.target {
                return Err(CompileError::InvalidGraph {
                    reason: format!("self-loop on node `{}`", edge.source),
                });
            }
        }
        Ok(())
    }

    /// Entry-point resolution: the first node (in declaration order) whose
    /// type matches the highest-priority trigger-like type present in the
    /// spec, else the first declared node.
    pub fn resolve_entry<'a>(&self, spec: &'a GraphSpec) -> Result<&'a str, CompileError> {
        for kind in &self.entry_priority {
            if let Some(node) = spec.nodes.iter().find(|n| &n.kind == kind) {
                return Ok(&node.id);
            }
        }
        spec.nodes
            .first()
            .map(|n| n.id.as_str())
            .ok_or(CompileError::NoEntryPoint)
    }

    /// Full compilation: validate, resolve the entry, inject terminal edges
    /// for dangling nodes, index adjacency, and reject cyclic plans.
    #[tracing::instrument(skip(self, spec, handlers), err)]
    pub fn compile(
        &self,
        spec: &GraphSpec,
        handlers: &HandlerRegistry,
    ) -> Result<ExecutablePlan, CompileError> {
        self.validate(spec)?;
        let entry = self.resolve_entry(spec)?.to_string();

        let mut adjacency: FxHashMap<String, Vec<String>> = FxHashMap::default();
        let mut predecessors: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for node in &spec.nodes {
            adjacency.entry(node.id.clone()).or_default();
        }
        for edge in &spec.edges {
            if let Some(successors) = adjacency.get_mut(&edge.source) {
                successors.push(edge.target.clone());
            }
            predecessors
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
        }

        // Dangling nodes get an implicit edge to the terminal sink so the
        // plan cannot deadlock on a branch that simply stops.
        for (id, successors) in adjacency.iter_mut() {
            if successors.is_empty() {
                tracing::debug!(node = %id, "injecting terminal edge");
                successors.push(END.to_string());
            }
            successors.sort_unstable();
            successors.dedup();
        }
        for preds in predecessors.values_mut() {
            preds.sort_unstable();
            preds.dedup();
        }

        self.check_acyclic(&entry, &adjacency)?;

        let resolved = spec
            .nodes
            .iter()
            .map(|node| {
                let handler: Arc<dyn Handler> = handlers.resolve(&node.kind, &node.config);
                (node.id.clone(), handler)
            })
            .collect();

        tracing::debug!(
            entry = %entry,
            nodes = spec.nodes.len(),
            edges = spec.edges.len(),
            "graph compiled"
        );
        Ok(ExecutablePlan::new(entry, adjacency, predecessors, resolved))
    }

    /// Depth-first walk from the entry; a back edge to a node on the current
    /// path is a cycle.
    fn check_acyclic(
        &self,
        entry: &str,
        adjacency: &FxHashMap<String, Vec<String>>,
    ) -> Result<(), CompileError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            OnPath,
            Done,
        }

        let mut marks: FxHashMap<&str, Mark> = FxHashMap::default();
        // Explicit stack; Leave pops the path marker after children finish.
        enum Visit<'a> {
            Enter(&'a str),
            Leave(&'a str),
        }
        let mut stack = vec![Visit::Enter(entry)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(node) => match marks.get(node) {
                    Some(Mark::OnPath) => {
                        return Err(CompileError::CycleDetected {
                            node: node.to_string(),
                        })
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(node, Mark::OnPath);
                        stack.push(Visit::Leave(node));
                        if let Some(successors) = adjacency.get(node) {
                            for next in successors {
                                if next != END {
                                    match marks.get(next.as_str()) {
                                        Some(Mark::OnPath) => {
                                            return Err(CompileError::CycleDetected {
                                                node: next.clone(),
                                            })
                                        }
                                        Some(Mark::Done) => {}
                                        None => stack.push(Visit::Enter(next)),
                                    }
                                }
                            }
                        }
                    }
                },
                Visit::Leave(node) => {
                    marks.insert(node, Mark::Done);
                }
            }
        }
        Ok(())
    }
}
