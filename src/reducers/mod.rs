//! Per-field merge rules and the state-schema guard.
//!
//! Each run-state field is owned by exactly one reducer, registered in the
//! [`ReducerRegistry`]. Reducers are pure with respect to execution order for
//! append and union semantics; last-write-wins fields rely on the executor's
//! deterministic node-id merge order for their tie-break. Isolating merge
//! policy here is what makes it testable independently of scheduling.

mod append;
mod last_write;
mod map_merge;
mod reducer_registry;

pub use append::{AppendContext, AppendExecutionLog};
pub use last_write::OverwriteOutput;
pub use map_merge::MergeIntermediateSteps;
pub use reducer_registry::ReducerRegistry;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::state::RunState;

/// Merges one incoming value into the run state for the reducer's own field.
pub trait Reducer: Send + Sync {
    fn apply(&self, state: &mut RunState, incoming: Value) -> Result<(), ReducerError>;
}

/// Rejection from an individual reducer: the incoming value does not have the
/// shape its field requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} for field `{field}`, got {got}")]
pub struct ReducerError {
    pub field: &'static str,
    pub expected: &'static str,
    pub got: &'static str,
}

/// A handler returned data outside the run-state schema.
///
/// Always fatal to the run: an unknown field, a caller-owned field, or a
/// wrong-shaped value indicates a programming defect in a handler, not a
/// transient external failure, so the executor reports it instead of
/// continuing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("schema violation in node `{node}`, field `{field}`: {reason}")]
#[diagnostic(
    code(canvasflow::reducers::schema_violation),
    help("Handlers may only return the declared run-state fields, using the shapes their reducers expect.")
)]
pub struct SchemaViolation {
    /// Id of the offending node.
    pub node: String,
    /// Field name as the handler returned it.
    pub field: String,
    pub reason: String,
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
