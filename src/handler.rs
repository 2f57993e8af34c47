//! The handler contract: the boundary between the core and node behaviors.
//!
//! Everything a node actually *does* (model calls, store lookups, outbound
//! integrations) lives behind [`Handler`]. The core only requires the update
//! shape and the failure signal defined here; it never special-cases a node
//! type.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::delta::StateDelta;
use crate::events::{RunEvent, RunEventKind};
use crate::state::StateSnapshot;

/// An executable unit behind a node type.
///
/// Handlers receive the run state as committed at the end of the previous
/// superstep and return only the delta they contribute. They must not assume
/// sibling output from the same superstep is visible, because it is not.
///
/// # Failure semantics
///
/// Returning `Err(HandlerError)` marks this node as failed but does **not**
/// abort the run: the executor records the failure and schedules successors
/// as usual. A handler that wants the whole run to stop has exactly one
/// lever, and it is a defect lever: returning a field outside the state
/// schema, which the reducer layer treats as fatal.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError>;
}

/// Execution context passed to a handler for one superstep.
#[derive(Clone, Debug)]
pub struct HandlerContext {
    /// Id of the node being executed.
    pub node_id: String,
    /// Superstep number, starting at 1.
    pub superstep: u64,
    events: Option<flume::Sender<RunEvent>>,
}

impl HandlerContext {
    pub(crate) fn new(
        node_id: impl Into<String>,
        superstep: u64,
        events: Option<flume::Sender<RunEvent>>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            superstep,
            events,
        }
    }

    /// Emit a node-scoped diagnostic message.
    ///
    /// Delivery is best effort: the message always lands in tracing, and it
    /// is forwarded to the run event channel when a subscriber is attached.
    /// A full or disconnected channel never fails the handler.
    pub fn emit(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(node = %self.node_id, step = self.superstep, "{message}");
        if let Some(sender) = &self.events {
            let _ = sender.try_send(RunEvent::now(RunEventKind::NodeMessage {
                node: self.node_id.clone(),
                step: self.superstep,
                message,
            }));
        }
    }
}

/// Failure of a single node's external collaborator.
///
/// Contained per node by the executor: recorded under
/// `intermediate_steps[<node id>]` and `execution_log`, after which the run
/// continues.
#[derive(Debug, Error, Diagnostic)]
pub enum HandlerError {
    /// Expected input data is missing from the snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(canvasflow::handler::missing_input),
        help("Check that an upstream node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// An external provider or service failed.
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(canvasflow::handler::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// JSON (de)serialization failed inside the handler.
    #[error(transparent)]
    #[diagnostic(code(canvasflow::handler::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Any other handler-internal failure, with a human-readable cause.
    #[error("{0}")]
    #[diagnostic(code(canvasflow::handler::failed))]
    Failed(String),
}

impl HandlerError {
    /// Convenience constructor for the catch-all variant.
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}
