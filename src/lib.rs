//! # Canvasflow: a compiler and execution engine for visually-edited agent graphs
//!
//! Canvasflow takes the node/edge graph a visual editor submits, compiles it
//! into an executable plan, and runs it to completion with a superstep
//! scheduler. Each node's handler returns a partial state update that is
//! merged into the shared run state through per-field reducers, in a
//! deterministic order, with per-node failure isolation.
//!
//! ## Core Concepts
//!
//! - **Graph spec**: The declarative node/edge description submitted for a run
//! - **Handlers**: Async units of work resolved from a node's `type` string
//! - **Run state**: A fixed five-field schema accumulated across one run
//! - **Reducers**: Per-field merge rules (append, last-write, key-wise union)
//! - **Superstep**: One scheduler round in which every ready node runs
//!   concurrently before any merge is committed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canvasflow::engine::Engine;
//! use canvasflow::registry::HandlerRegistry;
//! use canvasflow::spec::{EdgeSpec, GraphSpec, NodeSpec};
//!
//! # async fn example() -> Result<(), canvasflow::compiler::CompileError> {
//! let spec = GraphSpec::new(
//!     vec![
//!         NodeSpec::new("start", "chat-trigger"),
//!         NodeSpec::new("goal", "agent-goal"),
//!     ],
//!     vec![EdgeSpec::new("start", "goal")],
//! );
//!
//! let engine = Engine::new(HandlerRegistry::with_builtins());
//! let result = engine.compile_and_run(&spec, "hello").await?;
//! println!("output: {:?}", result.output);
//! # Ok(())
//! # }
//! ```
//!
//! ## Execution model
//!
//! Compilation validates the structure up front (dangling edges, duplicate
//! ids, cycles), resolves the entry node by trigger-type priority, and injects
//! an implicit edge to the terminal sink for every dangling node so acyclic
//! plans always terminate. Execution then proceeds in supersteps: every node
//! whose predecessors have all completed runs against the state snapshot
//! committed at the end of the previous superstep, and the resulting deltas
//! are merged in node-id order so last-write ties are deterministic.
//!
//! A failing handler never aborts the run: the failure is recorded in the run
//! state and its successors are scheduled as usual. Only a handler that
//! returns data outside the state schema ends the run early, since that is a
//! programming defect rather than a transient integration failure.
//!
//! ## Module Guide
//!
//! - [`spec`] - Graph spec types submitted by the editor
//! - [`state`] - Run state schema and snapshots
//! - [`delta`] - Partial updates returned by handlers
//! - [`handler`] - Handler trait and execution context
//! - [`registry`] - Handler factories keyed by node type
//! - [`handlers`] - Built-in pure handlers (trigger, goal, tooling, post-processing)
//! - [`reducers`] - Per-field merge rules and the schema guard
//! - [`compiler`] - Validation, entry resolution, and plan building
//! - [`plan`] - The compiled, read-only executable plan
//! - [`executor`] - Superstep scheduler and barrier merges
//! - [`engine`] - High-level compile-and-run facade
//! - [`events`] - Run event stream for observability
//! - [`config`] - Engine configuration
//! - [`telemetry`] - Tracing setup helper

pub mod compiler;
pub mod config;
pub mod delta;
pub mod engine;
pub mod events;
pub mod executor;
pub mod handler;
pub mod handlers;
pub mod plan;
pub mod reducers;
pub mod registry;
pub mod spec;
pub mod state;
pub mod telemetry;
