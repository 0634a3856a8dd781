//! Pipeline context handed to every component call.
//!
//! The context is a read-only view built once from the frozen
//! configuration at pipeline init, plus the one shared mutable object
//! the pipeline has: the scoped key/value store. It is cheaply
//! cloneable (`Arc` inside) and never owns the pipeline; components
//! talk back through deliverers, the KV store and the shutdown signal,
//! which keeps the ownership graph acyclic.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, warn};

/// Bound applied to every component `on_start`/`on_stop` call.
///
/// A component that overruns it is logged and left behind: the phase
/// proceeds, the call keeps running on the blocking pool.
pub const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Engine settings from the `[engine]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Capacity of each dispatcher queue. Admission control: input
    /// deliverers block once the start queue is full.
    pub events_capacity: usize,

    /// Escalate the first handler error or recovered panic into
    /// pipeline termination.
    pub fail_fast: bool,

    /// Enable the verbose data-path logging guarded by
    /// [`Context::on_if_log_verbose`].
    pub log_verbose: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            events_capacity: 8,
            fail_fast: false,
            log_verbose: false,
        }
    }
}

/// Top-level sections of the configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Engine,
    Globals,
    Plugins,
    Outputs,
    Interceptors,
    Drivers,
    Inputs,
    Logics,
}

impl std::fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Engine => "engine",
            Self::Globals => "globals",
            Self::Plugins => "plugins",
            Self::Outputs => "outputs",
            Self::Interceptors => "interceptors",
            Self::Drivers => "drivers",
            Self::Inputs => "inputs",
            Self::Logics => "logics",
        };
        f.write_str(name)
    }
}

/// Pipeline shutdown token.
///
/// Fired once when the pipeline stops. Input devices select on
/// [`fired`](Self::fired) to make their serve loops interruptible, and
/// the dispatcher uses it to switch into drain mode.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an unfired signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the signal. Idempotent.
    pub fn fire(&self) {
        let _ = self.tx.send(true);
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves when the signal fires; immediately if it already has.
    pub async fn fired(&self) {
        let mut rx = self.tx.subscribe();
        // wait_for also covers the already-fired case.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

struct ContextInner {
    settings: EngineSettings,
    sections: HashMap<ConfigSection, Value>,
    kv: RwLock<HashMap<String, Value>>,
    shutdown: ShutdownSignal,
}

/// Scoped view over configuration and shared pipeline state.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Starts building a context.
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Engine settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Raw view over one configuration section, if present.
    #[must_use]
    pub fn section(&self, section: ConfigSection) -> Option<&Value> {
        self.inner.sections.get(&section)
    }

    /// Looks up a key in the `[globals]` section.
    #[must_use]
    pub fn global(&self, key: &str) -> Option<&Value> {
        self.section(ConfigSection::Globals)?.get(key)
    }

    /// Stores a value in the scoped KV store.
    ///
    /// The store is the one shared mutable object between components;
    /// it is safe for concurrent get/put.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.kv.write().insert(key.into(), value.into());
    }

    /// Reads a value from the scoped KV store.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.kv.read().get(key).cloned()
    }

    /// Whether the first non-recoverable error terminates the pipeline.
    #[must_use]
    pub fn is_fail_fast(&self) -> bool {
        self.inner.settings.fail_fast
    }

    /// Whether verbose data-path logging is enabled.
    #[must_use]
    pub fn is_log_verbose(&self) -> bool {
        self.inner.settings.log_verbose
    }

    /// Runs `f` only when verbose logging is enabled, keeping the
    /// formatting cost off the hot path otherwise.
    pub fn on_if_log_verbose(&self, f: impl FnOnce()) {
        if self.inner.settings.log_verbose {
            f();
        }
    }

    /// The pipeline shutdown token.
    #[must_use]
    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.inner.shutdown
    }

    /// Runs blocking `work` on the blocking pool, waiting at most
    /// `limit`.
    ///
    /// On timeout a warning naming `tag` is logged and `None` is
    /// returned; the work itself is *not* aborted, it finishes in the
    /// background so lifecycle phases stay monotonic.
    pub async fn check_timeout<T, F>(&self, tag: &str, limit: Duration, work: F) -> Option<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);
        match tokio::time::timeout(limit, handle).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(join_err)) => {
                error!(tag, error = %join_err, "timed call panicked");
                None
            }
            Err(_) => {
                warn!(tag, limit_ms = limit.as_millis() as u64, "call exceeded time limit, proceeding");
                None
            }
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.inner.settings)
            .field("shutdown_fired", &self.inner.shutdown.is_fired())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Context`].
#[derive(Default)]
pub struct ContextBuilder {
    settings: EngineSettings,
    sections: HashMap<ConfigSection, Value>,
    shutdown: Option<ShutdownSignal>,
}

impl ContextBuilder {
    /// Sets the engine settings.
    #[must_use]
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Attaches a raw configuration section view.
    #[must_use]
    pub fn section(mut self, section: ConfigSection, value: Value) -> Self {
        self.sections.insert(section, value);
        self
    }

    /// Uses an externally created shutdown signal (the pipeline shares
    /// its own with the context).
    #[must_use]
    pub fn shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Finishes the context.
    #[must_use]
    pub fn build(self) -> Context {
        Context {
            inner: Arc::new(ContextInner {
                settings: self.settings,
                sections: self.sections,
                kv: RwLock::new(HashMap::new()),
                shutdown: self.shutdown.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_defaults() {
        let s = EngineSettings::default();
        assert_eq!(s.events_capacity, 8);
        assert!(!s.fail_fast);
        assert!(!s.log_verbose);
    }

    #[test]
    fn kv_store_roundtrip() {
        let ctx = Context::builder().build();
        assert!(ctx.get("shared").is_none());
        ctx.put("shared", json!({"n": 1}));
        assert_eq!(ctx.get("shared"), Some(json!({"n": 1})));
    }

    #[test]
    fn kv_store_concurrent_access() {
        let ctx = Context::builder().build();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let ctx = ctx.clone();
                scope.spawn(move || {
                    ctx.put(format!("k{i}"), i);
                    let _ = ctx.get("k0");
                });
            }
        });
        assert_eq!(ctx.get("k7"), Some(json!(7)));
    }

    #[test]
    fn globals_lookup() {
        let ctx = Context::builder()
            .section(ConfigSection::Globals, json!({"site": "plant-2"}))
            .build();
        assert_eq!(ctx.global("site"), Some(&json!("plant-2")));
        assert!(ctx.global("absent").is_none());
    }

    #[test]
    fn verbose_gate() {
        let quiet = Context::builder().build();
        let mut ran = false;
        quiet.on_if_log_verbose(|| ran = true);
        assert!(!ran);

        let verbose = Context::builder()
            .settings(EngineSettings {
                log_verbose: true,
                ..Default::default()
            })
            .build();
        let mut ran = false;
        verbose.on_if_log_verbose(|| ran = true);
        assert!(ran);
    }

    #[tokio::test]
    async fn shutdown_signal_fires_once() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_fired());
        signal.fire();
        signal.fire();
        assert!(signal.is_fired());
        // Resolves immediately when already fired.
        signal.fired().await;
    }

    #[tokio::test]
    async fn shutdown_signal_wakes_waiters() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.fired().await });
        tokio::task::yield_now().await;
        signal.fire();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn check_timeout_returns_value_in_time() {
        let ctx = Context::builder().build();
        let got = ctx
            .check_timeout("fast.start", Duration::from_secs(1), || 42)
            .await;
        assert_eq!(got, Some(42));
    }

    #[tokio::test]
    async fn check_timeout_proceeds_on_overrun() {
        let ctx = Context::builder().build();
        let got = ctx
            .check_timeout("slow.start", Duration::from_millis(20), || {
                std::thread::sleep(Duration::from_millis(200));
                42
            })
            .await;
        assert_eq!(got, None);
    }
}
