//! Two-stage event dispatcher.
//!
//! Two bounded queues and one serve task:
//!
//! ```text
//! deliverer ──▶ start queue ──▶ interceptor stage ──▶ end queue
//!                                      │ (drop)            │
//!                                      ▼                   ▼
//!                                 output stage ◀──── driver stage
//!                                      │
//!                                      ▼
//!                              session reply channel
//! ```
//!
//! The serve task only multiplexes: each session is handed to its own
//! spawned worker, so a slow interceptor or driver never head-of-line
//! blocks admission. The bounded start queue is the sole admission
//! control: deliverers block in `send` when it is full.
//!
//! On shutdown the serve task stops admitting and drains: queued
//! sessions still run both stages, in-flight workers finish, and every
//! admitted session gets its reply.

use crate::deliverer::PipelineOutputDeliverer;
use crate::registry::{Entry, Registry};
use futures::FutureExt;
use gantry_component::{Context, HandlerError, Interceptor, ShutdownSignal};
use gantry_event::EventSession;
use gantry_types::any_match;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Session attribute recording time spent up to the interceptor stage.
pub const ATTR_INTERCEPTOR_ELAPSED: &str = "interceptor_elapsed";
/// Session attribute recording time spent up to the driver stage.
pub const ATTR_DRIVER_ELAPSED: &str = "driver_elapsed";

/// Latch tripped by the first non-recoverable fault under fail-fast.
///
/// Tripping fires the shutdown signal, so the pipeline winds down and
/// the process can exit non-zero once the supervisor observes the
/// latch.
#[derive(Clone)]
pub(crate) struct FailFastLatch {
    tripped: Arc<AtomicBool>,
    shutdown: ShutdownSignal,
}

impl FailFastLatch {
    pub(crate) fn new(shutdown: ShutdownSignal) -> Self {
        Self {
            tripped: Arc::new(AtomicBool::new(false)),
            shutdown,
        }
    }

    pub(crate) fn trip(&self) {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            error!("fail-fast tripped, shutting the pipeline down");
            self.shutdown.fire();
        }
    }

    pub(crate) fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

/// Shared state the dispatcher workers run against.
pub(crate) struct PipelineCore {
    pub(crate) registry: Arc<Registry>,
    pub(crate) ctx: Context,
    pub(crate) end_tx: mpsc::Sender<EventSession>,
    pub(crate) latch: FailFastLatch,
}

impl PipelineCore {
    /// Logs a handler error, escalating under fail-fast.
    fn handler_fault(&self, component: &str, err: &HandlerError) {
        if self.ctx.is_fail_fast() {
            error!(component, error = %err, "handler failed, escalating");
            self.latch.trip();
        } else {
            error!(component, error = %err, "handler failed");
        }
    }

    /// Logs a recovered worker panic, escalating under fail-fast.
    fn recovered(&self, stage: &str, payload: &(dyn std::any::Any + Send)) {
        let msg = panic_message(payload);
        error!(stage, panic = %msg, "worker panicked, session marked faulty");
        if self.ctx.is_fail_fast() {
            self.latch.trip();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// The dispatcher's sending side, kept by the pipeline.
pub(crate) struct Dispatcher {
    start_tx: mpsc::Sender<EventSession>,
    end_tx: mpsc::Sender<EventSession>,
}

/// The receiving side, consumed by the serve task.
pub(crate) struct DispatcherQueues {
    start_rx: mpsc::Receiver<EventSession>,
    end_rx: mpsc::Receiver<EventSession>,
}

impl Dispatcher {
    /// Creates the two bounded queues.
    pub(crate) fn new(capacity: usize) -> (Self, DispatcherQueues) {
        let (start_tx, start_rx) = mpsc::channel(capacity);
        let (end_tx, end_rx) = mpsc::channel(capacity);
        (
            Self { start_tx, end_tx },
            DispatcherQueues { start_rx, end_rx },
        )
    }

    /// Admission queue sender, one clone per input deliverer.
    pub(crate) fn start_sender(&self) -> mpsc::Sender<EventSession> {
        self.start_tx.clone()
    }

    /// End queue sender, for the pipeline core.
    pub(crate) fn end_sender(&self) -> mpsc::Sender<EventSession> {
        self.end_tx.clone()
    }
}

/// The serve loop. Runs until shutdown, then drains.
pub(crate) async fn serve(core: Arc<PipelineCore>, queues: DispatcherQueues) {
    let DispatcherQueues {
        mut start_rx,
        mut end_rx,
    } = queues;
    let shutdown = core.ctx.shutdown().clone();
    let mut workers = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.fired() => break,
            Some(session) = start_rx.recv() => {
                let core = core.clone();
                workers.spawn(async move { interceptor_stage(core, session).await });
            }
            Some(session) = end_rx.recv() => {
                let core = core.clone();
                workers.spawn(async move { driver_stage(core, session).await });
            }
            else => break,
        }
    }

    drain(&core, &mut workers, &mut start_rx, &mut end_rx).await;
    debug!("dispatcher stopped");
}

/// Post-shutdown drain: every already-admitted session still runs to
/// completion so its reply is delivered.
async fn drain(
    core: &Arc<PipelineCore>,
    workers: &mut JoinSet<()>,
    start_rx: &mut mpsc::Receiver<EventSession>,
    end_rx: &mut mpsc::Receiver<EventSession>,
) {
    loop {
        while let Ok(session) = start_rx.try_recv() {
            let core = core.clone();
            workers.spawn(async move { interceptor_stage(core, session).await });
        }
        tokio::select! {
            Some(session) = end_rx.recv() => {
                let core = core.clone();
                workers.spawn(async move { driver_stage(core, session).await });
            }
            joined = workers.join_next() => {
                if joined.is_some() {
                    continue;
                }
                // No worker in flight; one final queue sweep before
                // declaring the dispatcher dry.
                if let Ok(session) = end_rx.try_recv() {
                    let core = core.clone();
                    workers.spawn(async move { driver_stage(core, session).await });
                } else if let Ok(session) = start_rx.try_recv() {
                    let core = core.clone();
                    workers.spawn(async move { interceptor_stage(core, session).await });
                } else {
                    break;
                }
            }
            else => break,
        }
    }
}

enum StageOutcome {
    Forward,
    Dropped,
}

/// Interceptor stage worker: one session, synchronous handler chain.
async fn interceptor_stage(core: Arc<PipelineCore>, mut session: EventSession) {
    core.ctx.on_if_log_verbose(|| {
        debug!(session = %session.session_id(), topic = session.topic(), "interceptor stage");
    });

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        run_interceptors(&core, &mut session)
    }));

    match outcome {
        Ok(StageOutcome::Forward) => {
            let elapsed = session.since().as_millis() as u64;
            session.add_attribute(ATTR_INTERCEPTOR_ELAPSED, elapsed);
            if core.end_tx.send(session).await.is_err() {
                // Dispatcher gone mid-flight; the dropped session wakes
                // the deliverer through its closed reply channel.
                warn!("end queue closed, session discarded");
            }
        }
        Ok(StageOutcome::Dropped) => {
            let elapsed = session.since().as_millis() as u64;
            session.outbound_mut().add_field("error", "InterceptorDropped");
            session.add_attribute(ATTR_INTERCEPTOR_ELAPSED, elapsed);
            finish(&core, session);
        }
        Err(payload) => {
            core.recovered("interceptor", payload.as_ref());
            session.outbound_mut().add_field("error", "InternalError");
            finish(&core, session);
        }
    }
}

fn run_interceptors(core: &PipelineCore, session: &mut EventSession) -> StageOutcome {
    let matched: Vec<&Entry<dyn Interceptor>> = core
        .registry
        .interceptors()
        .iter()
        .filter(|entry| any_match(&entry.meta.topic_exprs, session.topic()))
        .collect();

    for entry in matched {
        core.ctx.on_if_log_verbose(|| {
            debug!(
                interceptor = %entry.meta.label(),
                topic = session.topic(),
                "invoking interceptor"
            );
        });
        match entry.component.handle(session, &core.ctx) {
            Ok(()) => {}
            Err(HandlerError::Dropped) => {
                debug!(interceptor = %entry.meta.label(), "session dropped by interceptor");
                return StageOutcome::Dropped;
            }
            Err(err) => core.handler_fault(&entry.meta.label(), &err),
        }
    }
    StageOutcome::Forward
}

/// Driver stage worker: one session, every matching driver in order.
async fn driver_stage(core: Arc<PipelineCore>, mut session: EventSession) {
    core.ctx.on_if_log_verbose(|| {
        debug!(session = %session.session_id(), topic = session.topic(), "driver stage");
    });

    let outputs = PipelineOutputDeliverer::new(core.registry.clone(), core.ctx.clone());
    let result = AssertUnwindSafe(run_drivers(&core, &outputs, &mut session))
        .catch_unwind()
        .await;

    match result {
        Ok(()) => {
            let elapsed = session.since().as_millis() as u64;
            session.add_attribute(ATTR_DRIVER_ELAPSED, elapsed);
            finish(&core, session);
        }
        Err(payload) => {
            core.recovered("driver", payload.as_ref());
            session.outbound_mut().add_field("error", "InternalError");
            finish(&core, session);
        }
    }
}

async fn run_drivers(
    core: &PipelineCore,
    outputs: &PipelineOutputDeliverer,
    session: &mut EventSession,
) {
    for entry in core.registry.drivers() {
        if !any_match(&entry.meta.topic_exprs, session.topic()) {
            continue;
        }
        core.ctx.on_if_log_verbose(|| {
            debug!(driver = %entry.meta.label(), topic = session.topic(), "invoking driver");
        });
        if let Err(err) = entry.component.handle(session, outputs, &core.ctx).await {
            core.handler_fault(&entry.meta.label(), &err);
        }
    }
}

/// Output stage: deliver the reply. Exactly one per session.
fn finish(core: &PipelineCore, session: EventSession) {
    core.ctx.on_if_log_verbose(|| {
        debug!(session = %session.session_id(), topic = session.topic(), "output stage");
        for (key, value) in session.attributes() {
            debug!(session = %session.session_id(), attribute = key, value = %value, "session attribute");
        }
    });
    if !session.complete() {
        debug!("reply receiver dropped before completion");
    }
}
