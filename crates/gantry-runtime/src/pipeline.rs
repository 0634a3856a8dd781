//! Pipeline assembly and lifecycle supervision.
//!
//! The pipeline drives four phases:
//!
//! ```text
//! Init ──▶ Start ──▶ Serve ──▶ Stop
//! ```
//!
//! - **Init** builds the context, registers and initializes every
//!   component, and spawns the dispatcher serve task.
//! - **Start** runs `on_start` for plugins → outputs → drivers →
//!   inputs → logics, each bounded by [`LIFECYCLE_TIMEOUT`], then
//!   launches one serve worker per input device.
//! - **Serve** is the dispatcher's business; the supervisor only waits
//!   for a termination signal (or the fail-fast latch).
//! - **Stop** runs `on_stop` for inputs → drivers → outputs → plugins,
//!   fires the shutdown signal, and waits for the dispatcher drain and
//!   the input workers. Logic devices ride on their parent input and
//!   are never stopped individually.
//!
//! A component overrunning the lifecycle bound is logged and left
//! behind; phases stay monotonic, nothing is aborted.

use crate::config::PipelineConfig;
use crate::deliverer::PipelineInputDeliverer;
use crate::dispatcher::{self, Dispatcher, FailFastLatch, PipelineCore};
use crate::factory::FactoryRegistry;
use crate::hooks::{HookPoint, HookRegistry};
use crate::registry::Registry;
use crate::PipelineError;
use gantry_component::{
    ConfigSection, Context, InputDeliverer, ShutdownSignal, LIFECYCLE_TIMEOUT,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The assembled event pipeline.
///
/// Construct with [`Pipeline::init`], then [`start`](Self::start),
/// [`await_termination`](Self::await_termination) and
/// [`stop`](Self::stop). Requires a running tokio runtime.
pub struct Pipeline {
    ctx: Context,
    registry: Arc<Registry>,
    hooks: HookRegistry,
    dispatcher: Dispatcher,
    shutdown: ShutdownSignal,
    latch: FailFastLatch,
    serve_task: Option<JoinHandle<()>>,
    input_tasks: Vec<(String, JoinHandle<()>)>,
}

impl Pipeline {
    /// Builds the pipeline: validates the configuration, initializes
    /// every component and brings the dispatcher up.
    ///
    /// # Errors
    ///
    /// Any configuration or registration failure aborts construction;
    /// nothing has started at that point.
    pub fn init(
        config: PipelineConfig,
        factories: &FactoryRegistry,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let shutdown = ShutdownSignal::new();
        let ctx = Self::build_context(&config, shutdown.clone());
        info!(
            events_capacity = ctx.settings().events_capacity,
            fail_fast = ctx.settings().fail_fast,
            "pipeline initializing"
        );

        let registry = Arc::new(Registry::build(&config, factories, &ctx)?);
        info!(components = registry.len(), "components registered");

        let (dispatcher, queues) = Dispatcher::new(ctx.settings().events_capacity);
        let latch = FailFastLatch::new(shutdown.clone());
        let core = Arc::new(PipelineCore {
            registry: registry.clone(),
            ctx: ctx.clone(),
            end_tx: dispatcher.end_sender(),
            latch: latch.clone(),
        });
        let serve_task = tokio::spawn(dispatcher::serve(core, queues));

        Ok(Self {
            ctx,
            registry,
            hooks: HookRegistry::new(),
            dispatcher,
            shutdown,
            latch,
            serve_task: Some(serve_task),
            input_tasks: Vec::new(),
        })
    }

    fn build_context(config: &PipelineConfig, shutdown: ShutdownSignal) -> Context {
        let section = |configs: &[crate::config::ComponentConfig]| {
            serde_json::to_value(configs).unwrap_or(Value::Null)
        };
        Context::builder()
            .settings(config.engine.clone())
            .section(ConfigSection::Globals, Value::Object(config.globals.clone()))
            .section(ConfigSection::Plugins, section(&config.plugins))
            .section(ConfigSection::Outputs, section(&config.outputs))
            .section(ConfigSection::Interceptors, section(&config.interceptors))
            .section(ConfigSection::Drivers, section(&config.drivers))
            .section(ConfigSection::Inputs, section(&config.inputs))
            .section(ConfigSection::Logics, section(&config.logics))
            .shutdown(shutdown)
            .build()
    }

    /// Starts every component, then launches one serve worker per
    /// input device.
    ///
    /// Start failures and overruns are logged (or escalate under
    /// fail-fast); the phase always completes.
    pub async fn start(&mut self) {
        info!("pipeline starting");
        self.hooks.run(HookPoint::StartBefore, &self.ctx);

        for (label, component) in self.registry.start_chain() {
            let ctx = self.ctx.clone();
            let tag = format!("{label}.start");
            let outcome = self
                .ctx
                .check_timeout(&tag, LIFECYCLE_TIMEOUT, move || component.on_start(&ctx))
                .await;
            if let Some(Err(err)) = outcome {
                self.lifecycle_fault(&label, "start", &err);
            }
        }

        let inputs = self.registry.inputs().to_vec();
        for input in &inputs {
            let label = input.meta.label();
            let deliverer: Arc<dyn InputDeliverer> = Arc::new(PipelineInputDeliverer::new(
                self.registry.clone(),
                input.clone(),
                self.dispatcher.start_sender(),
                self.ctx.clone(),
            ));
            let ctx = self.ctx.clone();
            let entry = input.clone();
            let task_label = label.clone();
            let handle = tokio::spawn(async move {
                if let Err(err) = entry.component.serve(ctx, deliverer).await {
                    error!(input = %task_label, error = %err, "input device serve failed");
                }
                debug!(input = %task_label, "input device stopped");
            });
            self.input_tasks.push((label, handle));
        }

        self.hooks.run(HookPoint::StartAfter, &self.ctx);
        info!(inputs = self.input_tasks.len(), "pipeline started");
    }

    /// Stops inputs, drivers, outputs and plugins in that order, fires
    /// the shutdown signal and waits for the dispatcher to drain.
    pub async fn stop(&mut self) {
        info!("pipeline stopping");
        self.hooks.run(HookPoint::StopBefore, &self.ctx);

        for (label, component) in self.registry.stop_chain() {
            let ctx = self.ctx.clone();
            let tag = format!("{label}.stop");
            let outcome = self
                .ctx
                .check_timeout(&tag, LIFECYCLE_TIMEOUT, move || component.on_stop(&ctx))
                .await;
            if let Some(Err(err)) = outcome {
                error!(component = %label, error = %err, "stop failed");
            }
        }

        self.shutdown.fire();

        for (label, handle) in self.input_tasks.drain(..) {
            if tokio::time::timeout(LIFECYCLE_TIMEOUT, handle).await.is_err() {
                warn!(input = %label, "serve worker did not stop in time");
            }
        }
        if let Some(task) = self.serve_task.take() {
            if tokio::time::timeout(LIFECYCLE_TIMEOUT, task).await.is_err() {
                warn!("dispatcher did not drain in time");
            }
        }

        self.hooks.run(HookPoint::StopAfter, &self.ctx);
        info!("pipeline stopped");
    }

    /// Blocks until SIGINT/SIGTERM arrives or the shutdown signal
    /// fires (which the fail-fast latch does on escalation).
    pub async fn await_termination(&self) {
        let shutdown = self.shutdown.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut term = match signal(SignalKind::terminate()) {
                Ok(stream) => Some(stream),
                Err(err) => {
                    warn!(error = %err, "cannot listen for SIGTERM");
                    None
                }
            };
            let terminate = async {
                match term.as_mut() {
                    Some(stream) => {
                        stream.recv().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("interrupt received"),
                _ = terminate => info!("terminate received"),
                _ = shutdown.fired() => info!("shutdown signal fired"),
            }
        }

        #[cfg(not(unix))]
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("interrupt received"),
            _ = shutdown.fired() => info!("shutdown signal fired"),
        }
    }

    /// Returns `true` once a fault escalated under fail-fast.
    ///
    /// The process should exit non-zero in that case.
    #[must_use]
    pub fn fault_tripped(&self) -> bool {
        self.latch.is_tripped()
    }

    /// The pipeline context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The frozen component registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Lifecycle hooks; register before [`start`](Self::start).
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    fn lifecycle_fault(&self, label: &str, phase: &str, err: &gantry_component::ComponentError) {
        if self.ctx.is_fail_fast() {
            error!(component = %label, phase, error = %err, "lifecycle failed, escalating");
            self.latch.trip();
        } else {
            error!(component = %label, phase, error = %err, "lifecycle failed");
        }
    }
}
