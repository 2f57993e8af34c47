//! Handler registry: maps a node-type string to a factory for its handler.
//!
//! This is the sole extension point for node behaviors. New node types are
//! added by registering a factory; the compiler and executor never branch on
//! a type string themselves.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::delta::StateDelta;
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::spec::ConfigMap;
use crate::state::StateSnapshot;

/// Produces a [`Handler`] instance from a node's configuration map.
///
/// Implemented for any `Fn(&ConfigMap) -> Arc<dyn Handler>`, so most
/// registrations are closures:
///
/// ```rust
/// use std::sync::Arc;
/// use canvasflow::registry::HandlerRegistry;
/// use canvasflow::handlers::AgentGoal;
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("agent-goal", |config: &canvasflow::spec::ConfigMap| {
///     Arc::new(AgentGoal::from_config(config)) as Arc<dyn canvasflow::handler::Handler>
/// });
/// ```
pub trait HandlerFactory: Send + Sync {
    fn create(&self, config: &ConfigMap) -> Arc<dyn Handler>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&ConfigMap) -> Arc<dyn Handler> + Send + Sync,
{
    fn create(&self, config: &ConfigMap) -> Arc<dyn Handler> {
        self(config)
    }
}

/// Registry of handler factories keyed by node-type string.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: FxHashMap<String, Arc<dyn HandlerFactory>>,
}

impl HandlerRegistry {
    /// An empty registry; every resolution falls back to the no-op handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in pure handlers
    /// (see [`handlers`](crate::handlers)).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::handlers::register_builtins(&mut registry);
        registry
    }

    /// Register a factory for a node type, replacing any previous one.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        factory: impl HandlerFactory + 'static,
    ) -> &mut Self {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_handler(
        mut self,
        kind: impl Into<String>,
        factory: impl HandlerFactory + 'static,
    ) -> Self {
        self.register(kind, factory);
        self
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Resolve a handler for a node type.
    ///
    /// An unregistered type resolves to [`NoopHandler`] so a graph with an
    /// unknown node never deadlocks or aborts; it simply passes state through.
    #[must_use]
    pub fn resolve(&self, kind: &str, config: &ConfigMap) -> Arc<dyn Handler> {
        match self.factories.get(kind) {
            Some(factory) => factory.create(config),
            None => {
                tracing::warn!(kind, "no handler registered for node type; using no-op");
                Arc::new(NoopHandler)
            }
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

/// Fallback handler for unregistered node types: returns an empty delta.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

#[async_trait::async_trait]
impl Handler for NoopHandler {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: HandlerContext,
    ) -> Result<StateDelta, HandlerError> {
        ctx.emit("no registered handler; passing state through");
        Ok(StateDelta::new())
    }
}
