//! Partial state updates returned by handler execution.
//!
//! A [`StateDelta`] is deliberately map-shaped rather than struct-shaped: the
//! handler contract allows an update keyed by any field name, and the reducer
//! registry is the one place that decides whether a name is inside the schema.
//! A struct here would make the schema guard unrepresentable; a map keeps it
//! testable.

use rustc_hash::FxHashMap;
use serde_json::{json, Value};

/// The changes one handler wants merged into the run state.
///
/// All entries are optional; an empty delta is a valid result (a node that
/// only has side effects, or the no-op fallback handler). The builder helpers
/// produce values in the shapes the schema reducers expect.
///
/// # Examples
///
/// ```rust
/// use canvasflow::delta::StateDelta;
/// use serde_json::json;
///
/// let delta = StateDelta::new()
///     .with_output("Done.")
///     .with_context_entry("Available Tool: search")
///     .with_log_entry("[tool-definition] advertised search")
///     .with_step("tool-definition", json!("search"));
/// assert!(!delta.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDelta {
    fields: FxHashMap<String, Value>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw access for the reducer registry.
    #[must_use]
    pub fn fields(&self) -> &FxHashMap<String, Value> {
        &self.fields
    }

    /// Set a field to a raw JSON value. Prefer the typed helpers below; this
    /// exists for handlers that assemble updates dynamically (and is how a
    /// defective handler ends up producing a schema violation).
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Propose a new `output`; last write (in node-id merge order) wins.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.fields
            .insert("output".to_string(), Value::String(output.into()));
        self
    }

    /// Append one line to `context`.
    #[must_use]
    pub fn with_context_entry(self, entry: impl Into<String>) -> Self {
        self.push_to_list("context", entry.into())
    }

    /// Append one line to `execution_log`.
    #[must_use]
    pub fn with_log_entry(self, entry: impl Into<String>) -> Self {
        self.push_to_list("execution_log", entry.into())
    }

    /// Record an `intermediate_steps` entry; a repeated key overwrites.
    #[must_use]
    pub fn with_step(mut self, key: impl Into<String>, value: Value) -> Self {
        let steps = self
            .fields
            .entry("intermediate_steps".to_string())
            .or_insert_with(|| json!({}));
        if let Value::Object(map) = steps {
            map.insert(key.into(), value);
        }
        self
    }

    fn push_to_list(mut self, field: &str, entry: String) -> Self {
        let list = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| json!([]));
        if let Value::Array(items) = list {
            items.push(Value::String(entry));
        }
        self
    }
}

impl From<FxHashMap<String, Value>> for StateDelta {
    fn from(fields: FxHashMap<String, Value>) -> Self {
        Self { fields }
    }
}
