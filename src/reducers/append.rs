use serde_json::Value;

use super::{kind_of, Reducer, ReducerError};
use crate::state::RunState;

fn take_string_list(
    field: &'static str,
    incoming: Value,
) -> Result<Vec<String>, ReducerError> {
    let Value::Array(items) = incoming else {
        return Err(ReducerError {
            field,
            expected: "an array of strings",
            got: kind_of(&incoming),
        });
    };
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(line) => lines.push(line),
            other => {
                return Err(ReducerError {
                    field,
                    expected: "an array of strings",
                    got: kind_of(&other),
                })
            }
        }
    }
    Ok(lines)
}

/// Appends to `context`, preserving arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppendContext;

impl Reducer for AppendContext {
    fn apply(&self, state: &mut RunState, incoming: Value) -> Result<(), ReducerError> {
        state
            .context
            .extend(take_string_list("context", incoming)?);
        Ok(())
    }
}

/// Appends to `execution_log`, preserving arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppendExecutionLog;

impl Reducer for AppendExecutionLog {
    fn apply(&self, state: &mut RunState, incoming: Value) -> Result<(), ReducerError> {
        state
            .execution_log
            .extend(take_string_list("execution_log", incoming)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preserves_arrival_order() {
        let mut state = RunState::for_input("");
        AppendContext.apply(&mut state, json!(["a"])).unwrap();
        AppendContext.apply(&mut state, json!(["b", "c"])).unwrap();
        assert_eq!(state.context, vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_non_array() {
        let mut state = RunState::for_input("");
        let err = AppendContext
            .apply(&mut state, json!("not-a-list"))
            .unwrap_err();
        assert_eq!(err.got, "a string");
        assert!(state.context.is_empty());
    }

    #[test]
    fn rejects_non_string_element() {
        let mut state = RunState::for_input("");
        assert!(AppendExecutionLog
            .apply(&mut state, json!(["ok", 3]))
            .is_err());
    }
}
