//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use canvasflow::delta::StateDelta;
use canvasflow::handler::{Handler, HandlerContext, HandlerError};
use canvasflow::registry::HandlerRegistry;
use canvasflow::spec::{ConfigMap, EdgeSpec, GraphSpec, NodeSpec};
use canvasflow::state::StateSnapshot;
use serde_json::json;
use std::sync::Arc;

/// Records its own id and writes the run input into intermediate_steps.
pub struct Echo;

#[async_trait]
impl Handler for Echo {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        Ok(StateDelta::new()
            .with_step(&ctx.node_id, json!(snapshot.input.clone()))
            .with_log_entry(format!("[{}] echoed", ctx.node_id)))
    }
}

/// Appends its id to context, so merge ordering is observable.
pub struct Tag;

#[async_trait]
impl Handler for Tag {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        Ok(StateDelta::new().with_context_entry(ctx.node_id.clone()))
    }
}

/// Writes its id as the output, so last-write behavior is observable.
pub struct WriteOutput;

#[async_trait]
impl Handler for WriteOutput {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        Ok(StateDelta::new().with_output(ctx.node_id.clone()))
    }
}

/// Writes its own id under the shared `intermediate_steps` key `"claim"`,
/// so same-key collisions between siblings are observable.
pub struct ClaimStep;

#[async_trait]
impl Handler for ClaimStep {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        Ok(StateDelta::new().with_step("claim", json!(ctx.node_id)))
    }
}

/// Always fails with a fixed message.
pub struct Failing;

#[async_trait]
impl Handler for Failing {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        Err(HandlerError::msg("boom"))
    }
}

/// Returns a delta addressed at a field outside the state schema.
pub struct RogueField;

#[async_trait]
impl Handler for RogueField {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        let mut delta = StateDelta::new();
        delta.insert("scratchpad", json!("nope"));
        Ok(delta)
    }
}

/// Sleeps long enough that a test can cancel mid-superstep.
pub struct Slow;

#[async_trait]
impl Handler for Slow {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(StateDelta::new().with_context_entry(ctx.node_id.clone()))
    }
}

/// A registry wiring the fixture handlers to type strings the graph builders
/// below use.
pub fn test_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("echo", |_: &ConfigMap| Arc::new(Echo) as Arc<dyn Handler>)
        .register("tag", |_: &ConfigMap| Arc::new(Tag) as Arc<dyn Handler>)
        .register("write-output", |_: &ConfigMap| {
            Arc::new(WriteOutput) as Arc<dyn Handler>
        })
        .register("claim-step", |_: &ConfigMap| {
            Arc::new(ClaimStep) as Arc<dyn Handler>
        })
        .register("failing", |_: &ConfigMap| {
            Arc::new(Failing) as Arc<dyn Handler>
        })
        .register("rogue", |_: &ConfigMap| {
            Arc::new(RogueField) as Arc<dyn Handler>
        })
        .register("slow", |_: &ConfigMap| Arc::new(Slow) as Arc<dyn Handler>);
    registry
}

/// A straight chain `n1 -> n2 -> ... -> nLEN`, all of the given type.
pub fn chain(len: usize, kind: &str) -> GraphSpec {
    let nodes = (1..=len)
        .map(|i| NodeSpec::new(format!("n{i}"), kind))
        .collect();
    let edges = (1..len)
        .map(|i| EdgeSpec::new(format!("n{i}"), format!("n{}", i + 1)))
        .collect();
    GraphSpec::new(nodes, edges)
}

/// A diamond: `top -> left, top -> right, left -> join, right -> join`.
pub fn diamond(kind: &str) -> GraphSpec {
    GraphSpec::new(
        vec![
            NodeSpec::new("top", kind),
            NodeSpec::new("left", kind),
            NodeSpec::new("right", kind),
            NodeSpec::new("join", kind),
        ],
        vec![
            EdgeSpec::new("top", "left"),
            EdgeSpec::new("top", "right"),
            EdgeSpec::new("left", "join"),
            EdgeSpec::new("right", "join"),
        ],
    )
}
