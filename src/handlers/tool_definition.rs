use async_trait::async_trait;

use crate::delta::StateDelta;
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::spec::ConfigMap;
use crate::state::StateSnapshot;

/// Advertises a tool to downstream reasoning nodes via `context`.
///
/// Config keys: `toolName` (string). The tool's schema/code stays with the
/// embedding application; the core only records availability.
#[derive(Clone, Debug)]
pub struct ToolDefinition {
    tool_name: String,
}

impl ToolDefinition {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
        }
    }

    pub fn from_config(config: &ConfigMap) -> Self {
        Self {
            tool_name: config
                .get("toolName")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown_tool")
                .to_string(),
        }
    }
}

#[async_trait]
impl Handler for ToolDefinition {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        ctx.emit(format!("registering tool: {}", self.tool_name));
        Ok(StateDelta::new().with_context_entry(format!("Available Tool: {}", self.tool_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn advertises_tool_in_context() {
        let delta = ToolDefinition::new("crm_lookup")
            .run(StateSnapshot::default(), HandlerContext::new("t", 1, None))
            .await
            .unwrap();
        assert_eq!(
            delta.fields()["context"],
            json!(["Available Tool: crm_lookup"])
        );
    }

    #[test]
    fn missing_name_falls_back() {
        let handler = ToolDefinition::from_config(&ConfigMap::default());
        assert_eq!(handler.tool_name, "unknown_tool");
    }
}
