//! The top-level facade tying compiler and executor together.
//!
//! An [`Engine`] owns a handler registry, a reducer registry, and its config,
//! and is cheap to clone and share across requests.

use crate::compiler::{CompileError, Compiler};
use crate::config::EngineConfig;
use crate::events::RunEvent;
use crate::executor::{CancelSignal, Executor, RunResult};
use crate::plan::ExecutablePlan;
use crate::reducers::ReducerRegistry;
use crate::registry::HandlerRegistry;
use crate::spec::GraphSpec;
use crate::state::RunState;

#[derive(Clone)]
pub struct Engine {
    handlers: HandlerRegistry,
    reducers: ReducerRegistry,
    config: EngineConfig,
}

impl Engine {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self {
            handlers,
            reducers: ReducerRegistry::default(),
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_reducers(mut self, reducers: ReducerRegistry) -> Self {
        self.reducers = reducers;
        self
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Compile a graph against this engine's registry without running it.
    /// Useful for validating editor payloads on save.
    pub fn compile(&self, spec: &GraphSpec) -> Result<ExecutablePlan, CompileError> {
        Compiler::new()
            .with_entry_priority(self.config.entry_priority.clone())
            .compile(spec, &self.handlers)
    }

    /// Run a previously compiled plan.
    #[tracing::instrument(skip_all, fields(entry = %plan.entry()))]
    pub async fn run(&self, plan: &ExecutablePlan, input: impl Into<String>) -> RunResult {
        self.executor().run(plan, input).await
    }

    /// Run from a pre-populated initial state, e.g. a resumed conversation.
    #[tracing::instrument(skip_all, fields(entry = %plan.entry()))]
    pub async fn run_with_state(&self, plan: &ExecutablePlan, state: RunState) -> RunResult {
        self.executor().run_with_state(plan, state).await
    }

    /// Compile then run in one call, the common path for serving editor
    /// payloads directly.
    #[tracing::instrument(skip_all)]
    pub async fn compile_and_run(
        &self,
        spec: &GraphSpec,
        input: impl Into<String>,
    ) -> Result<RunResult, CompileError> {
        let plan = self.compile(spec)?;
        Ok(self.run(&plan, input).await)
    }

    /// Run with a live event feed. The receiver can be drained concurrently
    /// or after the run; the channel is bounded by `event_capacity` and sends
    /// are best effort, so a slow consumer drops events rather than stalling
    /// execution.
    #[tracing::instrument(skip_all, fields(entry = %plan.entry()))]
    pub async fn run_with_events(
        &self,
        plan: &ExecutablePlan,
        input: impl Into<String>,
    ) -> (RunResult, flume::Receiver<RunEvent>) {
        let (tx, rx) = flume::bounded(self.config.event_capacity);
        let result = self.executor().with_events(tx).run(plan, input).await;
        (result, rx)
    }

    /// Run with a cancel hook. Cancellation lands between supersteps and
    /// committed work is kept; see [`crate::executor::CancelToken`].
    #[tracing::instrument(skip_all, fields(entry = %plan.entry()))]
    pub async fn run_cancellable(
        &self,
        plan: &ExecutablePlan,
        input: impl Into<String>,
        signal: CancelSignal,
    ) -> RunResult {
        self.executor()
            .run_cancellable(plan, RunState::for_input(input), signal)
            .await
    }

    fn executor(&self) -> Executor {
        Executor::new(self.reducers.clone(), self.config.concurrency_limit)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
