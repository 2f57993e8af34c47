mod common;

use canvasflow::compiler::Compiler;
use canvasflow::executor::{CancelToken, Executor, RunStatus};
use canvasflow::reducers::ReducerRegistry;
use canvasflow::spec::{EdgeSpec, GraphSpec, NodeSpec};
use canvasflow::state::RunState;
use serde_json::json;

use common::{chain, diamond, test_registry};

fn executor() -> Executor {
    Executor::new(ReducerRegistry::default(), 8)
}

#[tokio::test]
async fn linear_chain_runs_one_superstep_per_node() {
    let plan = Compiler::new()
        .compile(&chain(4, "tag"), &test_registry())
        .unwrap();
    let result = executor().run(&plan, "hi").await;
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.supersteps, 4);
    assert_eq!(result.state.context, ["n1", "n2", "n3", "n4"]);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn diamond_joins_in_one_superstep() {
    let plan = Compiler::new()
        .compile(&diamond("tag"), &test_registry())
        .unwrap();
    let result = executor().run(&plan, "hi").await;
    // top | left+right | join
    assert_eq!(result.supersteps, 3);
    assert_eq!(result.state.context, ["top", "left", "right", "join"]);
}

#[tokio::test]
async fn sibling_merge_order_is_node_id_lexical() {
    // Both branches append context in the same superstep; merge order must
    // not depend on which task finishes first.
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("root", "tag"),
            NodeSpec::new("zeta", "tag"),
            NodeSpec::new("alpha", "tag"),
        ],
        vec![
            EdgeSpec::new("root", "zeta"),
            EdgeSpec::new("root", "alpha"),
        ],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    for _ in 0..20 {
        let result = executor().run(&plan, "hi").await;
        assert_eq!(result.state.context, ["root", "alpha", "zeta"]);
    }
}

#[tokio::test]
async fn sibling_output_writes_resolve_by_merge_order() {
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("root", "tag"),
            NodeSpec::new("b", "write-output"),
            NodeSpec::new("a", "write-output"),
        ],
        vec![EdgeSpec::new("root", "b"), EdgeSpec::new("root", "a")],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    for _ in 0..20 {
        let result = executor().run(&plan, "hi").await;
        // "b" merges after "a", so its write lands last.
        assert_eq!(result.output.as_deref(), Some("b"));
    }
}

#[tokio::test]
async fn trigger_then_echo_records_input() {
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("trigger", "tag"),
            NodeSpec::new("echo", "echo"),
        ],
        vec![EdgeSpec::new("trigger", "echo")],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    let result = executor().run(&plan, "hi").await;
    assert_eq!(result.supersteps, 2);
    assert_eq!(result.state.intermediate_steps.len(), 1);
    assert_eq!(
        result.state.intermediate_steps.get("echo"),
        Some(&json!("hi"))
    );
}

#[tokio::test]
async fn same_step_key_resolves_by_merge_order() {
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("root", "tag"),
            NodeSpec::new("s2", "claim-step"),
            NodeSpec::new("s1", "claim-step"),
        ],
        vec![EdgeSpec::new("root", "s2"), EdgeSpec::new("root", "s1")],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    for _ in 0..20 {
        let result = executor().run(&plan, "hi").await;
        // "s2" merges after "s1", so its value is the one that sticks.
        assert_eq!(
            result.state.intermediate_steps.get("claim"),
            Some(&json!("s2"))
        );
    }
}

#[tokio::test]
async fn reruns_are_state_identical() {
    let plan = Compiler::new()
        .compile(&diamond("tag"), &test_registry())
        .unwrap();
    let exec = executor();
    let first = exec.run(&plan, "same").await;
    let second = exec.run(&plan, "same").await;
    assert_eq!(first.state, second.state);
    assert_eq!(first.supersteps, second.supersteps);
}

#[tokio::test]
async fn failure_is_contained_and_successors_still_run() {
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("a", "tag"),
            NodeSpec::new("c", "failing"),
            NodeSpec::new("d", "tag"),
        ],
        vec![EdgeSpec::new("a", "c"), EdgeSpec::new("c", "d")],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    let result = executor().run(&plan, "hi").await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].node, "c");
    assert!(result.errors[0].message.contains("boom"));
    // The downstream node still ran.
    assert_eq!(result.state.context, ["a", "d"]);
    // The failure left a trace in the state itself.
    assert!(result
        .state
        .execution_log
        .iter()
        .any(|line| line.starts_with("[c] error:")));
    assert_eq!(
        result.state.intermediate_steps.get("c"),
        Some(&json!({ "error": result.errors[0].message }))
    );
}

#[tokio::test]
async fn sibling_failure_does_not_block_the_other_branch() {
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("root", "tag"),
            NodeSpec::new("bad", "failing"),
            NodeSpec::new("good", "tag"),
        ],
        vec![
            EdgeSpec::new("root", "bad"),
            EdgeSpec::new("root", "good"),
        ],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    let result = executor().run(&plan, "hi").await;
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.state.context, ["root", "good"]);
    assert_eq!(result.errors.len(), 1);
}

#[tokio::test]
async fn schema_violation_aborts_with_state_preserved() {
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("a", "tag"),
            NodeSpec::new("b", "rogue"),
            NodeSpec::new("never", "tag"),
        ],
        vec![EdgeSpec::new("a", "b"), EdgeSpec::new("b", "never")],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    let result = executor().run(&plan, "hi").await;

    match &result.status {
        RunStatus::SchemaViolation(violation) => {
            assert_eq!(violation.node, "b");
            assert_eq!(violation.field, "scratchpad");
        }
        other => panic!("expected schema violation, got {other:?}"),
    }
    // Work committed before the violation survives; the successor never ran.
    assert_eq!(result.state.context, ["a"]);
    assert_eq!(result.supersteps, 2);
}

#[tokio::test]
async fn cancellation_keeps_committed_supersteps() {
    let spec = GraphSpec::new(
        vec![NodeSpec::new("fast", "tag"), NodeSpec::new("stuck", "slow")],
        vec![EdgeSpec::new("fast", "stuck")],
    );
    let plan = Compiler::new().compile(&spec, &test_registry()).unwrap();
    let (token, signal) = CancelToken::new();

    let exec = executor();
    let run = tokio::spawn(async move {
        exec.run_cancellable(&plan, RunState::for_input("hi"), signal)
            .await
    });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    token.cancel();

    let result = run.await.unwrap();
    assert_eq!(result.status, RunStatus::Cancelled);
    // The first superstep committed before the cancel landed.
    assert_eq!(result.state.context, ["fast"]);
    assert_eq!(result.supersteps, 1);
}

#[tokio::test]
async fn single_node_graph_takes_one_superstep() {
    let plan = Compiler::new()
        .compile(&chain(1, "tag"), &test_registry())
        .unwrap();
    let result = executor().run(&plan, "hi").await;
    assert_eq!(result.supersteps, 1);
    assert_eq!(result.state.context, ["n1"]);
}

#[tokio::test]
async fn initial_state_carries_prior_context() {
    let plan = Compiler::new()
        .compile(&chain(1, "tag"), &test_registry())
        .unwrap();
    let state = RunState::builder()
        .with_input("again")
        .with_context_entry("earlier turn")
        .build();
    let result = executor().run_with_state(&plan, state).await;
    assert_eq!(result.state.context, ["earlier turn", "n1"]);
    assert_eq!(result.state.input, "again");
}

#[tokio::test]
async fn unreachable_nodes_never_execute() {
    let spec = GraphSpec::new(
        vec![
            NodeSpec::new("a", "chat-trigger"),
            NodeSpec::new("island", "tag"),
        ],
        vec![],
    );
    let mut registry = test_registry();
    canvasflow::handlers::register_builtins(&mut registry);
    let plan = Compiler::new().compile(&spec, &registry).unwrap();
    let result = executor().run(&plan, "hi").await;
    assert_eq!(result.supersteps, 1);
    assert!(result.state.context.is_empty());
}

#[tokio::test]
async fn run_ids_are_unique_per_run() {
    let plan = Compiler::new()
        .compile(&chain(1, "tag"), &test_registry())
        .unwrap();
    let exec = executor();
    let first = exec.run(&plan, "x").await;
    let second = exec.run(&plan, "x").await;
    assert_ne!(first.run_id, second.run_id);
}
