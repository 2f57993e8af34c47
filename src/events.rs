//! Run events: a lightweight observability stream for one workflow execution.
//!
//! The executor emits an event per node transition and per barrier commit over
//! a `flume` channel. Emission is best effort with `try_send`; a slow or
//! absent subscriber never stalls the scheduler. Everything emitted here is
//! mirrored into `tracing`, so the channel is an add-on for callers that want
//! to forward progress (e.g. to a websocket), not the only record.

use chrono::{DateTime, Utc};

/// One observable moment of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunEvent {
    /// When the event was emitted.
    pub when: DateTime<Utc>,
    pub kind: RunEventKind,
}

impl RunEvent {
    pub(crate) fn now(kind: RunEventKind) -> Self {
        Self {
            when: Utc::now(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunEventKind {
    /// A superstep began with the given ready set (node-id order).
    SuperstepStarted { step: u64, nodes: Vec<String> },
    /// A handler called [`HandlerContext::emit`](crate::handler::HandlerContext::emit).
    NodeMessage {
        node: String,
        step: u64,
        message: String,
    },
    /// A node's handler returned a delta.
    NodeCompleted { node: String, step: u64 },
    /// A node's handler failed; the run continues without it.
    NodeFailed {
        node: String,
        step: u64,
        message: String,
    },
    /// All deltas for a superstep were merged; lists which fields changed.
    SuperstepCommitted {
        step: u64,
        updated_fields: Vec<&'static str>,
    },
    /// The run reached a terminal state.
    RunFinished { supersteps: u64 },
}

/// Best-effort emit helper shared by the executor and handler context.
pub(crate) fn emit(sender: &Option<flume::Sender<RunEvent>>, kind: RunEventKind) {
    if let Some(sender) = sender {
        let _ = sender.try_send(RunEvent::now(kind));
    }
}
