use serde_json::Value;

use super::{kind_of, Reducer, ReducerError};
use crate::state::RunState;

/// Last-write-wins semantics for `output`.
///
/// The tie-break between nodes of the same superstep is the executor's
/// node-id merge order, not handler completion order. `null` is accepted and
/// clears the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverwriteOutput;

impl Reducer for OverwriteOutput {
    fn apply(&self, state: &mut RunState, incoming: Value) -> Result<(), ReducerError> {
        match incoming {
            Value::String(text) => state.output = Some(text),
            Value::Null => state.output = None,
            other => {
                return Err(ReducerError {
                    field: "output",
                    expected: "a string or null",
                    got: kind_of(&other),
                })
            }
        }
        Ok(())
    }
}
