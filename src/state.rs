//! Run state: the shared, fixed-schema data accumulated across one run.
//!
//! The schema has exactly five fields, each owned by one reducer:
//!
//! | field | type | merge rule |
//! |---|---|---|
//! | `input` | string | set by the caller, never written by handlers |
//! | `output` | optional string | last write wins |
//! | `context` | list of strings | append in arrival order |
//! | `execution_log` | list of strings | append in arrival order |
//! | `intermediate_steps` | string-keyed map | key-wise union, repeat key overwrites |
//!
//! Handlers never touch a [`RunState`] directly: they receive an owned
//! [`StateSnapshot`] taken at the previous superstep's commit point and return
//! a [`StateDelta`](crate::delta::StateDelta). Only the executor applies
//! deltas, through the reducer registry.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Names the five run-state fields.
///
/// Parsing a handler-supplied field name through [`StateField::parse`] is the
/// first half of the schema guard; the reducer registry rejects anything that
/// does not parse, and rejects `input` because it has no handler-facing
/// reducer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateField {
    Input,
    Output,
    Context,
    ExecutionLog,
    IntermediateSteps,
}

impl StateField {
    /// Field name as it appears in handler deltas and serialized state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::Input => "input",
            StateField::Output => "output",
            StateField::Context => "context",
            StateField::ExecutionLog => "execution_log",
            StateField::IntermediateSteps => "intermediate_steps",
        }
    }

    /// Parse a field name; `None` means the name is outside the schema.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "input" => Some(StateField::Input),
            "output" => Some(StateField::Output),
            "context" => Some(StateField::Context),
            "execution_log" => Some(StateField::ExecutionLog),
            "intermediate_steps" => Some(StateField::IntermediateSteps),
            _ => None,
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evolving state for a single run.
///
/// Created once per run from the caller's input, mutated only by the executor
/// at superstep barriers, and returned in full inside the
/// [`RunResult`](crate::executor::RunResult). No state is shared between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Caller-supplied input; read-only for handlers.
    pub input: String,
    /// Final answer produced by the workflow, if any node wrote one.
    pub output: Option<String>,
    /// Accumulated context lines, in arrival order.
    pub context: Vec<String>,
    /// Human-readable trace of what ran, in arrival order.
    pub execution_log: Vec<String>,
    /// Per-node (or per-concern) intermediate values.
    pub intermediate_steps: FxHashMap<String, Value>,
}

impl RunState {
    /// Seed a fresh run state from the caller's input. The remaining fields
    /// start empty, matching the invocation boundary contract.
    pub fn for_input(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Builder for pre-seeded states (tests, replays, warm context).
    pub fn builder() -> RunStateBuilder {
        RunStateBuilder::default()
    }

    /// Take an owned, point-in-time copy for handlers to read.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            input: self.input.clone(),
            output: self.output.clone(),
            context: self.context.clone(),
            execution_log: self.execution_log.clone(),
            intermediate_steps: self.intermediate_steps.clone(),
        }
    }
}

/// Immutable view of the run state as committed at the end of the previous
/// superstep. Siblings in the same superstep all observe the same snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateSnapshot {
    pub input: String,
    pub output: Option<String>,
    pub context: Vec<String>,
    pub execution_log: Vec<String>,
    pub intermediate_steps: FxHashMap<String, Value>,
}

impl StateSnapshot {
    /// Context lines joined for prompt assembly, the way handlers typically
    /// consume them.
    #[must_use]
    pub fn joined_context(&self) -> String {
        self.context.join("\n")
    }
}

/// Fluent construction of a pre-populated [`RunState`].
#[derive(Debug, Default)]
pub struct RunStateBuilder {
    input: String,
    context: Vec<String>,
    intermediate_steps: FxHashMap<String, Value>,
}

impl RunStateBuilder {
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    #[must_use]
    pub fn with_context_entry(mut self, entry: impl Into<String>) -> Self {
        self.context.push(entry.into());
        self
    }

    #[must_use]
    pub fn with_step(mut self, key: impl Into<String>, value: Value) -> Self {
        self.intermediate_steps.insert(key.into(), value);
        self
    }

    pub fn build(self) -> RunState {
        RunState {
            input: self.input,
            output: None,
            context: self.context,
            execution_log: Vec::new(),
            intermediate_steps: self.intermediate_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_is_independent_of_state() {
        let mut state = RunState::for_input("hi");
        state.context.push("one".into());
        let snap = state.snapshot();
        state.context.push("two".into());
        assert_eq!(snap.context, vec!["one".to_string()]);
        assert_eq!(state.context.len(), 2);
    }

    #[test]
    fn field_names_round_trip() {
        for field in [
            StateField::Input,
            StateField::Output,
            StateField::Context,
            StateField::ExecutionLog,
            StateField::IntermediateSteps,
        ] {
            assert_eq!(StateField::parse(field.as_str()), Some(field));
        }
        assert_eq!(StateField::parse("messages"), None);
    }

    #[test]
    fn builder_seeds_context_and_steps() {
        let state = RunState::builder()
            .with_input("q")
            .with_context_entry("Mission: assist")
            .with_step("warm", json!(true))
            .build();
        assert_eq!(state.input, "q");
        assert_eq!(state.snapshot().joined_context(), "Mission: assist");
        assert_eq!(state.intermediate_steps.get("warm"), Some(&json!(true)));
    }
}
