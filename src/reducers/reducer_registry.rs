use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::{
    AppendContext, AppendExecutionLog, MergeIntermediateSteps, OverwriteOutput, Reducer,
    SchemaViolation,
};
use crate::delta::StateDelta;
use crate::state::{RunState, StateField};

/// Maps each run-state field to the reducer that owns it, and guards the
/// schema: a delta entry that names an unknown field, a field with no
/// handler-facing reducer, or a wrong-shaped value is a [`SchemaViolation`].
#[derive(Clone)]
pub struct ReducerRegistry {
    reducers: FxHashMap<StateField, Arc<dyn Reducer>>,
}

impl Default for ReducerRegistry {
    /// The standard schema wiring. `input` deliberately has no reducer: it is
    /// caller-owned, so a handler writing it is rejected.
    fn default() -> Self {
        Self::new()
            .with_reducer(StateField::Output, Arc::new(OverwriteOutput))
            .with_reducer(StateField::Context, Arc::new(AppendContext))
            .with_reducer(StateField::ExecutionLog, Arc::new(AppendExecutionLog))
            .with_reducer(
                StateField::IntermediateSteps,
                Arc::new(MergeIntermediateSteps),
            )
    }
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self {
            reducers: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, field: StateField, reducer: Arc<dyn Reducer>) -> &mut Self {
        self.reducers.insert(field, reducer);
        self
    }

    #[must_use]
    pub fn with_reducer(mut self, field: StateField, reducer: Arc<dyn Reducer>) -> Self {
        self.register(field, reducer);
        self
    }

    /// Merge one node's delta into the state.
    ///
    /// Entries are applied in sorted field-name order so a single delta
    /// produces the same state regardless of map iteration order. Returns the
    /// fields that received data.
    pub fn apply(
        &self,
        state: &mut RunState,
        node: &str,
        delta: &StateDelta,
    ) -> Result<Vec<StateField>, SchemaViolation> {
        let mut entries: Vec<_> = delta.fields().iter().collect();
        entries.sort_by(|(left, _), (right, _)| left.cmp(right));

        let mut updated = Vec::new();
        for (name, value) in entries {
            let field = StateField::parse(name).ok_or_else(|| SchemaViolation {
                node: node.to_string(),
                field: name.clone(),
                reason: "field is not part of the run-state schema".to_string(),
            })?;
            let reducer = self.reducers.get(&field).ok_or_else(|| SchemaViolation {
                node: node.to_string(),
                field: name.clone(),
                reason: "field is caller-owned and cannot be written by handlers".to_string(),
            })?;
            reducer
                .apply(state, value.clone())
                .map_err(|err| SchemaViolation {
                    node: node.to_string(),
                    field: name.clone(),
                    reason: err.to_string(),
                })?;
            updated.push(field);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applies_known_fields_in_name_order() {
        let registry = ReducerRegistry::default();
        let mut state = RunState::for_input("hi");
        let delta = StateDelta::new()
            .with_output("done")
            .with_context_entry("ctx")
            .with_step("k", json!(1));
        let updated = registry.apply(&mut state, "n", &delta).unwrap();
        assert_eq!(
            updated,
            vec![
                StateField::Context,
                StateField::IntermediateSteps,
                StateField::Output
            ]
        );
        assert_eq!(state.output.as_deref(), Some("done"));
        assert_eq!(state.context, vec!["ctx"]);
    }

    #[test]
    fn unknown_field_is_a_violation() {
        let registry = ReducerRegistry::default();
        let mut state = RunState::for_input("hi");
        let mut delta = StateDelta::new();
        delta.insert("messages", json!([]));
        let violation = registry.apply(&mut state, "bad", &delta).unwrap_err();
        assert_eq!(violation.node, "bad");
        assert_eq!(violation.field, "messages");
    }

    #[test]
    fn input_writes_are_rejected() {
        let registry = ReducerRegistry::default();
        let mut state = RunState::for_input("hi");
        let mut delta = StateDelta::new();
        delta.insert("input", json!("overwritten"));
        let violation = registry.apply(&mut state, "bad", &delta).unwrap_err();
        assert_eq!(violation.field, "input");
        assert_eq!(state.input, "hi");
    }

    #[test]
    fn wrong_shape_is_a_violation() {
        let registry = ReducerRegistry::default();
        let mut state = RunState::for_input("hi");
        let mut delta = StateDelta::new();
        delta.insert("context", json!("not-a-list"));
        assert!(registry.apply(&mut state, "bad", &delta).is_err());
    }
}
