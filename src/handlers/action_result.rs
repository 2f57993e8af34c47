use async_trait::async_trait;

use crate::delta::StateDelta;
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::spec::ConfigMap;
use crate::state::StateSnapshot;

/// How [`ActionResult`] transforms the current `output`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Processing {
    /// Pass the output through unchanged.
    #[default]
    Raw,
    /// Truncate to the first 50 characters with a marker prefix.
    Summarize,
    /// Substitute the output into a template via the `{{output}}` placeholder.
    Format { template: String },
}

/// Post-processes the workflow's `output` field.
///
/// Config keys: `processingType` (`"raw"`, `"summarize"`, `"format"`) and
/// `formatTemplate` (string, used by `format`).
#[derive(Clone, Debug, Default)]
pub struct ActionResult {
    processing: Processing,
}

impl ActionResult {
    pub fn new(processing: Processing) -> Self {
        Self { processing }
    }

    pub fn from_config(config: &ConfigMap) -> Self {
        let kind = config
            .get("processingType")
            .and_then(|v| v.as_str())
            .unwrap_or("raw");
        let processing = match kind {
            "summarize" => Processing::Summarize,
            "format" => Processing::Format {
                template: config
                    .get("formatTemplate")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => Processing::Raw,
        };
        Self { processing }
    }
}

#[async_trait]
impl Handler for ActionResult {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        let current = snapshot.output.unwrap_or_default();
        let processed = match &self.processing {
            Processing::Raw => current,
            Processing::Summarize => {
                let head: String = current.chars().take(50).collect();
                format!("[Summarized] {head}...")
            }
            Processing::Format { template } => {
                format!("Formatted: {}", template.replace("{{output}}", &current))
            }
        };
        Ok(StateDelta::new()
            .with_output(processed)
            .with_log_entry("[action-result] post-processed output"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RunState;
    use serde_json::json;

    fn snapshot_with_output(output: &str) -> StateSnapshot {
        let mut state = RunState::for_input("q");
        state.output = Some(output.to_string());
        state.snapshot()
    }

    #[tokio::test]
    async fn format_substitutes_template() {
        let handler = ActionResult::new(Processing::Format {
            template: "Answer: {{output}}".into(),
        });
        let delta = handler
            .run(snapshot_with_output("42"), HandlerContext::new("r", 1, None))
            .await
            .unwrap();
        assert_eq!(delta.fields()["output"], json!("Formatted: Answer: 42"));
    }

    #[tokio::test]
    async fn summarize_truncates() {
        let long = "x".repeat(120);
        let delta = ActionResult::new(Processing::Summarize)
            .run(snapshot_with_output(&long), HandlerContext::new("r", 1, None))
            .await
            .unwrap();
        let out = delta.fields()["output"].as_str().unwrap().to_string();
        assert!(out.starts_with("[Summarized] "));
        assert!(out.ends_with("..."));
        assert_eq!(out.len(), "[Summarized] ".len() + 50 + 3);
    }

    #[test]
    fn config_selects_processing() {
        let mut config = ConfigMap::default();
        config.insert("processingType".into(), json!("summarize"));
        assert_eq!(
            ActionResult::from_config(&config).processing,
            Processing::Summarize
        );
    }
}
