//! Superstep execution: snapshot isolation, fan-in barriers, deterministic
//! merges, contained node failures, and cooperative cancellation.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

use crate::delta::StateDelta;
use crate::events::{emit, RunEvent, RunEventKind};
use crate::handler::{HandlerContext, HandlerError};
use crate::plan::{ExecutablePlan, END};
use crate::reducers::{ReducerRegistry, SchemaViolation};
use crate::state::RunState;

/// How a run ended. Cancellation and schema violations still carry the state
/// committed so far; only compile errors produce no result at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every reachable node ran (or failed in isolation) and the frontier
    /// drained to the terminal sink.
    Completed,
    /// A cancel signal fired between supersteps; committed work is kept.
    Cancelled,
    /// A handler produced a delta the state schema cannot absorb. Fatal,
    /// but the state as of the last full commit is preserved.
    SchemaViolation(SchemaViolation),
}

/// One contained handler failure. The run keeps going; these accumulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeFailure {
    pub node: String,
    pub message: String,
    pub when: DateTime<Utc>,
}

/// The outcome of one run of a compiled plan.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: String,
    pub status: RunStatus,
    pub output: Option<String>,
    pub state: RunState,
    pub errors: Vec<NodeFailure>,
    pub supersteps: u64,
}

impl RunResult {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Cancel-side handle. Cheap to clone; firing it is idempotent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

/// Executor-side handle watching for a [`CancelToken`] to fire.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> (CancelToken, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelToken { tx: Arc::new(tx) }, CancelSignal { rx })
    }

    pub fn cancel(&self) {
        // Ignore send errors: the run may already have finished.
        let _ = self.tx.send(true);
    }
}

impl CancelSignal {
    /// Resolves once the paired token fires. If every token clone is dropped
    /// without firing, this pends forever, which lets the plain run path
    /// share the cancellable loop.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                futures_util::future::pending::<()>().await;
            }
        }
    }
}

/// Drives an [`ExecutablePlan`] to completion one superstep at a time.
#[derive(Clone)]
pub struct Executor {
    reducers: ReducerRegistry,
    events: Option<flume::Sender<RunEvent>>,
    concurrency_limit: usize,
}

impl Executor {
    pub fn new(reducers: ReducerRegistry, concurrency_limit: usize) -> Self {
        Self {
            reducers,
            events: None,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Attach an event channel. Sends are best effort; a full or dropped
    /// receiver never stalls the run.
    #[must_use]
    pub fn with_events(mut self, events: flume::Sender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run to completion with no external cancel hook.
    pub async fn run(&self, plan: &ExecutablePlan, input: impl Into<String>) -> RunResult {
        self.run_with_state(plan, RunState::for_input(input)).await
    }

    /// Run from a pre-populated initial state, e.g. a resumed conversation
    /// with prior context entries.
    pub async fn run_with_state(&self, plan: &ExecutablePlan, state: RunState) -> RunResult {
        let (_token, signal) = CancelToken::new();
        self.run_cancellable(plan, state, signal).await
    }

    /// Run to completion, checking `signal` between supersteps. A committed
    /// superstep is never rolled back; cancellation takes effect at the next
    /// barrier.
    pub async fn run_cancellable(
        &self,
        plan: &ExecutablePlan,
        mut state: RunState,
        mut signal: CancelSignal,
    ) -> RunResult {
        let run_id = Uuid::new_v4().to_string();
        let mut errors: Vec<NodeFailure> = Vec::new();
        let mut executed: FxHashSet<String> = FxHashSet::default();
        let mut frontier: Vec<String> = vec![plan.entry().to_string()];
        let mut supersteps: u64 = 0;
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));

        tracing::info!(run_id = %run_id, entry = %plan.entry(), "run started");

        loop {
            frontier.retain(|id| id != END);
            if frontier.is_empty() {
                break;
            }
            frontier.sort_unstable();
            frontier.dedup();

            supersteps += 1;
            let step = supersteps;
            emit(
                &self.events,
                RunEventKind::SuperstepStarted {
                    step,
                    nodes: frontier.clone(),
                },
            );
            tracing::debug!(run_id = %run_id, step, nodes = ?frontier, "superstep started");

            // Every node in the superstep reads the same snapshot.
            let snapshot = state.snapshot();
            let mut task_ids = Vec::with_capacity(frontier.len());
            let mut handles = Vec::with_capacity(frontier.len());
            for node_id in &frontier {
                let Some(handler) = plan.handler(node_id).cloned() else {
                    // END is filtered above and compilation resolved every
                    // declared node, so this arm is unreachable in practice.
                    continue;
                };
                let snapshot = snapshot.clone();
                let ctx = HandlerContext::new(node_id.clone(), step, self.events.clone());
                let semaphore = Arc::clone(&semaphore);
                task_ids.push(node_id.clone());
                handles.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    handler.run(snapshot, ctx).await
                }));
            }

            let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
            let barrier = join_all(handles);
            tokio::pin!(barrier);

            let joined = tokio::select! {
                joined = &mut barrier => joined,
                () = signal.cancelled() => {
                    for handle in abort_handles {
                        handle.abort();
                    }
                    tracing::info!(run_id = %run_id, step, "run cancelled");
                    emit(&self.events, RunEventKind::RunFinished { supersteps: step - 1 });
                    return RunResult {
                        run_id,
                        status: RunStatus::Cancelled,
                        output: state.output.clone(),
                        state,
                        errors,
                        supersteps: step - 1,
                    };
                }
            };

            // Collect outcomes, then merge in node-id order so the commit is
            // deterministic regardless of task completion order.
            let mut outcomes: Vec<(String, Result<StateDelta, HandlerError>)> =
                Vec::with_capacity(joined.len());
            for (id, joined_task) in task_ids.into_iter().zip(joined) {
                match joined_task {
                    Ok(outcome) => outcomes.push((id, outcome)),
                    Err(join_err) => {
                        // A panicked handler is contained like any failure.
                        tracing::error!(run_id = %run_id, node = %id, step, error = %join_err, "handler task failed to join");
                        outcomes.push((id, Err(HandlerError::msg(format!("task panicked: {join_err}")))));
                    }
                }
            }
            outcomes.sort_by(|a, b| a.0.cmp(&b.0));

            let mut updated: Vec<&'static str> = Vec::new();
            for (node_id, outcome) in outcomes {
                match outcome {
                    Ok(delta) => {
                        emit(
                            &self.events,
                            RunEventKind::NodeCompleted {
                                node: node_id.clone(),
                                step,
                            },
                        );
                        match self.reducers.apply(&mut state, &node_id, &delta) {
                            Ok(fields) => {
                                for field in fields {
                                    if !updated.contains(&field.as_str()) {
                                        updated.push(field.as_str());
                                    }
                                }
                            }
                            Err(violation) => {
                                tracing::error!(
                                    run_id = %run_id,
                                    node = %node_id,
                                    error = %violation,
                                    "schema violation, aborting run"
                                );
                                emit(
                                    &self.events,
                                    RunEventKind::NodeFailed {
                                        node: node_id.clone(),
                                        step,
                                        message: violation.to_string(),
                                    },
                                );
                                emit(&self.events, RunEventKind::RunFinished { supersteps: step });
                                return RunResult {
                                    run_id,
                                    status: RunStatus::SchemaViolation(violation),
                                    output: state.output.clone(),
                                    state,
                                    errors,
                                    supersteps: step,
                                };
                            }
                        }
                    }
                    Err(err) => {
                        let message = err.to_string();
                        tracing::warn!(
                            run_id = %run_id,
                            node = %node_id,
                            error = %message,
                            "handler failed; continuing"
                        );
                        emit(
                            &self.events,
                            RunEventKind::NodeFailed {
                                node: node_id.clone(),
                                step,
                                message: message.clone(),
                            },
                        );
                        let failure_delta = StateDelta::new()
                            .with_log_entry(format!("[{node_id}] error: {message}"))
                            .with_step(&node_id, serde_json::json!({ "error": message }));
                        if let Err(violation) = self.reducers.apply(&mut state, &node_id, &failure_delta) {
                            // Failure records use canonical fields, so this
                            // only trips if the registry was rewired without
                            // log or step reducers.
                            tracing::warn!(node = %node_id, error = %violation, "failure record dropped");
                        } else {
                            for field in ["execution_log", "intermediate_steps"] {
                                if !updated.contains(&field) {
                                    updated.push(field);
                                }
                            }
                        }
                        errors.push(NodeFailure {
                            node: node_id,
                            message,
                            when: Utc::now(),
                        });
                    }
                }
            }

            updated.sort_unstable();
            emit(
                &self.events,
                RunEventKind::SuperstepCommitted {
                    step,
                    updated_fields: updated,
                },
            );

            for id in &frontier {
                executed.insert(id.clone());
            }
            frontier = next_frontier(plan, &frontier, &executed);
        }

        emit(&self.events, RunEventKind::RunFinished { supersteps });
        tracing::info!(run_id = %run_id, supersteps, "run completed");
        RunResult {
            run_id,
            status: RunStatus::Completed,
            output: state.output.clone(),
            state,
            errors,
            supersteps,
        }
    }
}

/// The next ready set: successors of the nodes that just ran whose every
/// predecessor has committed. A node with a pending predecessor waits at the
/// barrier until that branch catches up.
fn next_frontier(
    plan: &ExecutablePlan,
    just_ran: &[String],
    executed: &FxHashSet<String>,
) -> Vec<String> {
    let mut next: Vec<String> = Vec::new();
    for id in just_ran {
        for successor in plan.successors(id) {
            if successor == END {
                continue;
            }
            if executed.contains(successor) || next.contains(successor) {
                continue;
            }
            let ready = plan
                .predecessors(successor)
                .iter()
                .all(|pred| executed.contains(pred));
            if ready {
                next.push(successor.clone());
            }
        }
    }
    next.sort_unstable();
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_idempotent() {
        let (token, mut signal) = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(*signal.rx.borrow_and_update());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_fire() {
        let (token, mut signal) = CancelToken::new();
        token.cancel();
        signal.cancelled().await;
    }
}
