//! Lifecycle hooks around the start and stop phases.

use gantry_component::Context;
use std::collections::HashMap;
use tracing::debug;

/// Where a hook runs relative to the lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before any component's `on_start`.
    StartBefore,
    /// After the last input's serve worker is launched.
    StartAfter,
    /// Before any component's `on_stop`.
    StopBefore,
    /// After the dispatcher has drained.
    StopAfter,
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StartBefore => "start_before",
            Self::StartAfter => "start_after",
            Self::StopBefore => "stop_before",
            Self::StopAfter => "stop_after",
        };
        f.write_str(name)
    }
}

/// A named lifecycle callback.
///
/// Hooks must be non-blocking: they run inline on the supervisor's
/// task, between lifecycle phases.
pub trait LifecycleHook: Send + Sync {
    /// Hook name, for logs.
    fn name(&self) -> &str;

    /// Runs the hook.
    fn run(&self, ctx: &Context);
}

struct FnHook<F> {
    name: String,
    f: F,
}

impl<F: Fn(&Context) + Send + Sync> LifecycleHook for FnHook<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &Context) {
        (self.f)(ctx);
    }
}

/// Ordered lists of hooks, one per [`HookPoint`].
///
/// Hooks run in registration order; there is no priority and no way to
/// abort a phase from a hook.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<HookPoint, Vec<Box<dyn LifecycleHook>>>,
}

impl HookRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook at `point`.
    pub fn register(&mut self, point: HookPoint, hook: Box<dyn LifecycleHook>) {
        self.hooks.entry(point).or_default().push(hook);
    }

    /// Registers a closure at `point`.
    pub fn register_fn(
        &mut self,
        point: HookPoint,
        name: impl Into<String>,
        f: impl Fn(&Context) + Send + Sync + 'static,
    ) {
        self.register(
            point,
            Box::new(FnHook {
                name: name.into(),
                f,
            }),
        );
    }

    /// Runs every hook registered at `point`, in registration order.
    pub fn run(&self, point: HookPoint, ctx: &Context) {
        let Some(hooks) = self.hooks.get(&point) else {
            return;
        };
        for hook in hooks {
            debug!(point = %point, hook = hook.name(), "running lifecycle hook");
            hook.run(ctx);
        }
    }

    /// Total number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Returns `true` when no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
