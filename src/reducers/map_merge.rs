use serde_json::Value;

use super::{kind_of, Reducer, ReducerError};
use crate::state::RunState;

/// Key-wise union into `intermediate_steps`; a repeated key overwrites its
/// previous value.
///
/// Keys from a single incoming object are applied in sorted order so the
/// merged map is identical across runs regardless of hash iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeIntermediateSteps;

impl Reducer for MergeIntermediateSteps {
    fn apply(&self, state: &mut RunState, incoming: Value) -> Result<(), ReducerError> {
        let Value::Object(entries) = incoming else {
            return Err(ReducerError {
                field: "intermediate_steps",
                expected: "an object",
                got: kind_of(&incoming),
            });
        };
        let mut pairs: Vec<_> = entries.into_iter().collect();
        pairs.sort_by(|(left, _), (right, _)| left.cmp(right));
        for (key, value) in pairs {
            state.intermediate_steps.insert(key, value);
        }
        Ok(())
    }
}
