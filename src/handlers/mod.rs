//! Built-in handlers.
//!
//! Only the node types whose behavior is pure state manipulation live here:
//! trigger receipt, goal/persona injection, tool advertisement, and output
//! post-processing. Everything that talks to the outside world (models,
//! stores, CRMs, messaging channels) is an external collaborator registered
//! by the embedding application.

mod action_result;
mod agent_goal;
mod chat_trigger;
mod tool_definition;

pub use action_result::ActionResult;
pub use agent_goal::AgentGoal;
pub use chat_trigger::ChatTrigger;
pub use tool_definition::ToolDefinition;

use std::sync::Arc;

use crate::handler::Handler;
use crate::registry::HandlerRegistry;
use crate::spec::ConfigMap;

/// Register every built-in handler under its canonical node-type string.
pub fn register_builtins(registry: &mut HandlerRegistry) {
    registry.register("chat-trigger", |_: &ConfigMap| {
        Arc::new(ChatTrigger) as Arc<dyn Handler>
    });
    registry.register("agent-goal", |config: &ConfigMap| {
        Arc::new(AgentGoal::from_config(config)) as Arc<dyn Handler>
    });
    registry.register("tool-definition", |config: &ConfigMap| {
        Arc::new(ToolDefinition::from_config(config)) as Arc<dyn Handler>
    });
    registry.register("action-result", |config: &ConfigMap| {
        Arc::new(ActionResult::from_config(config)) as Arc<dyn Handler>
    });
}
