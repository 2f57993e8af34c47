use async_trait::async_trait;

use crate::delta::StateDelta;
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::spec::ConfigMap;
use crate::state::StateSnapshot;

/// Injects the agent's mission (and optional persona) into `context`.
///
/// Config keys: `missionStatement` (string), `personaTone` (string, optional).
#[derive(Clone, Debug, Default)]
pub struct AgentGoal {
    mission: String,
    persona: Option<String>,
}

impl AgentGoal {
    pub fn new(mission: impl Into<String>) -> Self {
        Self {
            mission: mission.into(),
            persona: None,
        }
    }

    #[must_use]
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn from_config(config: &ConfigMap) -> Self {
        Self {
            mission: config
                .get("missionStatement")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            persona: config
                .get("personaTone")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        }
    }
}

#[async_trait]
impl Handler for AgentGoal {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        let context_entry = match &self.persona {
            Some(persona) => format!("System Persona: {persona}.\nMission: {}", self.mission),
            None => format!("Mission: {}", self.mission),
        };
        Ok(StateDelta::new()
            .with_context_entry(context_entry)
            .with_log_entry(format!("[agent-goal] injected mission: {}", self.mission)))
    }
}
