use async_trait::async_trait;
use serde_json::json;

use crate::delta::StateDelta;
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::state::StateSnapshot;

/// Entry node for chat-initiated runs.
///
/// Records that the run was triggered and echoes the inbound input into the
/// execution log. Carries no configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChatTrigger;

#[async_trait]
impl Handler for ChatTrigger {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        Ok(StateDelta::new()
            .with_step("chat-trigger", json!("Received Input"))
            .with_log_entry(format!(
                "[chat-trigger] triggered with input: {}",
                snapshot.input
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RunState;

    #[tokio::test]
    async fn records_receipt_and_logs_input() {
        let snapshot = RunState::for_input("hi").snapshot();
        let delta = ChatTrigger
            .run(snapshot, HandlerContext::new("t", 1, None))
            .await
            .unwrap();
        assert_eq!(
            delta.fields()["intermediate_steps"],
            json!({"chat-trigger": "Received Input"})
        );
        assert_eq!(
            delta.fields()["execution_log"],
            json!(["[chat-trigger] triggered with input: hi"])
        );
    }
}
