//! Engine tunables, settable in code or from the environment.

use crate::compiler::DEFAULT_ENTRY_PRIORITY;

const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Knobs for [`crate::engine::Engine`]. The defaults are sensible for a
/// single-process service; `from_env` layers `CANVASFLOW_*` variables on top.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on handlers running concurrently within one superstep.
    pub concurrency_limit: usize,
    /// Bounded capacity of run event channels handed out by the engine.
    pub event_capacity: usize,
    /// Trigger-type priority used to pick the entry node.
    pub entry_priority: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            concurrency_limit: parallelism,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            entry_priority: DEFAULT_ENTRY_PRIORITY
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `CANVASFLOW_CONCURRENCY` and
    /// `CANVASFLOW_EVENT_CAPACITY` where set and parseable. Loads a local
    /// `.env` file first if one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Some(limit) = env_usize("CANVASFLOW_CONCURRENCY") {
            config.concurrency_limit = limit.max(1);
        }
        if let Some(capacity) = env_usize("CANVASFLOW_EVENT_CAPACITY") {
            config.event_capacity = capacity.max(1);
        }
        config
    }

    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_entry_priority(mut self, priority: Vec<String>) -> Self {
        self.entry_priority = priority;
        self
    }
}

fn env_usize(key: &str) -> Option<usize> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparseable env override");
                None
            }
        },
        Err(_) => None,
    }
}
