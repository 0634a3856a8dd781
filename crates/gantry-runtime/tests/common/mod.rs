//! Shared test components: a channel-driven input harness plus small
//! interceptors, drivers and devices the end-to-end tests wire
//! together through real configuration trees.

#![allow(dead_code)]

use async_trait::async_trait;
use gantry_component::{
    Component, ComponentError, Context, DeliverError, Driver, HandlerError, InputDeliverer,
    InputDevice, Interceptor, LogicDevice, OutputDeliverer, Plugin,
};
use gantry_event::{Decoder, Encoder, EventSession, FramePacket, JsonCodec, JsonMap};
use gantry_runtime::{ComponentInstance, FactoryRegistry};
use serde_json::Value;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, Semaphore};

// ─── Input harness ───────────────────────────────────────────────

pub struct HarnessRequest {
    pub topic: String,
    pub frame: FramePacket,
    pub reply: oneshot::Sender<Result<FramePacket, DeliverError>>,
}

type RequestSlot = Arc<Mutex<Option<mpsc::Receiver<HarnessRequest>>>>;

/// Input device driven by a test-side channel.
///
/// Each request is served on its own task, so concurrent calls
/// interleave through the dispatcher exactly like frames from a real
/// transport.
pub struct HarnessInput {
    codec: JsonCodec,
    slot: RequestSlot,
}

impl Component for HarnessInput {}

#[async_trait]
impl InputDevice for HarnessInput {
    fn decoder(&self) -> &dyn Decoder {
        &self.codec
    }

    fn encoder(&self) -> &dyn Encoder {
        &self.codec
    }

    async fn serve(
        &self,
        ctx: Context,
        deliverer: Arc<dyn InputDeliverer>,
    ) -> Result<(), ComponentError> {
        let mut rx = self
            .slot
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ComponentError::ServeFailed("harness receiver already taken".into()))?;
        loop {
            tokio::select! {
                _ = ctx.shutdown().fired() => break,
                request = rx.recv() => {
                    let Some(request) = request else { break };
                    let deliverer = deliverer.clone();
                    tokio::spawn(async move {
                        let result = deliverer.deliver(&request.topic, request.frame).await;
                        let _ = request.reply.send(result);
                    });
                }
            }
        }
        Ok(())
    }
}

/// Test-side handle submitting frames through the harness input.
#[derive(Clone)]
pub struct HarnessHandle {
    tx: mpsc::Sender<HarnessRequest>,
}

impl HarnessHandle {
    /// Sends a JSON body on `topic` and decodes the reply.
    pub async fn call(&self, topic: &str, body: Value) -> Result<Value, DeliverError> {
        let frame = FramePacket::new(serde_json::to_vec(&body).expect("body encodes"));
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(HarnessRequest {
                topic: topic.to_string(),
                frame,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DeliverError::Shutdown)?;
        let frame = reply_rx.await.map_err(|_| DeliverError::Shutdown)??;
        Ok(serde_json::from_slice(frame.data()).expect("reply is JSON"))
    }
}

/// Registers a `HarnessInput` factory and returns the driving handle.
///
/// The factory hands the request receiver to the first instance it
/// creates; configure exactly one entry of this type.
pub fn register_harness_input(factories: &mut FactoryRegistry, buffer: usize) -> HarnessHandle {
    let (tx, rx) = mpsc::channel(buffer);
    let slot: RequestSlot = Arc::new(Mutex::new(Some(rx)));
    factories
        .register("HarnessInput", move || {
            ComponentInstance::Input(Box::new(HarnessInput {
                codec: JsonCodec,
                slot: slot.clone(),
            }))
        })
        .expect("type name free");
    HarnessHandle { tx }
}

// ─── Interceptors ────────────────────────────────────────────────

/// Interceptor that appends its name to a shared log; optionally drops
/// the session.
pub struct TraceInterceptor {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<&'static str>>>,
    pub drop_session: bool,
}

impl Component for TraceInterceptor {}

impl Interceptor for TraceInterceptor {
    fn handle(&self, _session: &mut EventSession, _ctx: &Context) -> Result<(), HandlerError> {
        self.log.lock().unwrap().push(self.name);
        if self.drop_session {
            Err(HandlerError::Dropped)
        } else {
            Ok(())
        }
    }
}

/// Interceptor counting the sessions that reach it.
pub struct CountInterceptor {
    pub count: Arc<AtomicUsize>,
}

impl Component for CountInterceptor {}

impl Interceptor for CountInterceptor {
    fn handle(&self, _session: &mut EventSession, _ctx: &Context) -> Result<(), HandlerError> {
        self.count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

// ─── Drivers ─────────────────────────────────────────────────────

/// Driver that reads inbound `v` and writes `v + 1` to the outbound
/// payload.
pub struct IncrementDriver;

impl Component for IncrementDriver {}

#[async_trait]
impl Driver for IncrementDriver {
    async fn handle(
        &self,
        session: &mut EventSession,
        _outputs: &dyn OutputDeliverer,
        _ctx: &Context,
    ) -> Result<(), HandlerError> {
        let v = session
            .inbound()
            .data
            .get("v")
            .and_then(Value::as_i64)
            .ok_or_else(|| HandlerError::failed("inbound payload lacks integer 'v'"))?;
        session.outbound_mut().add_field("v", v + 1);
        Ok(())
    }
}

/// Everything a capture driver saw of one session.
pub struct CapturedSession {
    pub topic: String,
    pub inbound: JsonMap,
    pub attributes: JsonMap,
}

/// Driver recording each session it handles.
pub struct CaptureDriver {
    pub seen: Arc<Mutex<Vec<CapturedSession>>>,
}

impl Component for CaptureDriver {}

#[async_trait]
impl Driver for CaptureDriver {
    async fn handle(
        &self,
        session: &mut EventSession,
        _outputs: &dyn OutputDeliverer,
        _ctx: &Context,
    ) -> Result<(), HandlerError> {
        self.seen.lock().unwrap().push(CapturedSession {
            topic: session.topic().to_string(),
            inbound: session.inbound().data.clone(),
            attributes: session.attributes().clone(),
        });
        Ok(())
    }
}

/// Driver that parks each session on a semaphore permit.
pub struct GatedDriver {
    pub gate: Arc<Semaphore>,
    pub entered: Arc<AtomicUsize>,
}

impl Component for GatedDriver {}

#[async_trait]
impl Driver for GatedDriver {
    async fn handle(
        &self,
        session: &mut EventSession,
        _outputs: &dyn OutputDeliverer,
        _ctx: &Context,
    ) -> Result<(), HandlerError> {
        self.entered.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| HandlerError::failed("gate closed"))?;
        permit.forget();
        session.outbound_mut().add_field("released", true);
        Ok(())
    }
}

/// Driver that calls one output device and records the outcome.
pub struct ProbeOutputDriver {
    pub target_uuid: &'static str,
    pub outcome: Arc<Mutex<Option<Result<JsonMap, String>>>>,
}

impl Component for ProbeOutputDriver {}

#[async_trait]
impl Driver for ProbeOutputDriver {
    async fn handle(
        &self,
        _session: &mut EventSession,
        outputs: &dyn OutputDeliverer,
        _ctx: &Context,
    ) -> Result<(), HandlerError> {
        let result = outputs
            .deliver(self.target_uuid, JsonMap::new())
            .await
            .map_err(|e| e.to_string());
        *self.outcome.lock().unwrap() = Some(result);
        // The failed delivery is logged, not fatal: the session still
        // completes with whatever outbound holds.
        Ok(())
    }
}

/// Driver that always fails.
pub struct FailingDriver;

impl Component for FailingDriver {}

#[async_trait]
impl Driver for FailingDriver {
    async fn handle(
        &self,
        _session: &mut EventSession,
        _outputs: &dyn OutputDeliverer,
        _ctx: &Context,
    ) -> Result<(), HandlerError> {
        Err(HandlerError::failed("deliberate failure"))
    }
}

// ─── Logic device ────────────────────────────────────────────────

/// Logic device claiming payloads with `kind == "temp"` and reshaping
/// them to `{celsius: value}`.
pub struct TempLogic;

impl Component for TempLogic {}

impl LogicDevice for TempLogic {
    fn check_if_match(&self, inbound: &JsonMap) -> bool {
        inbound.get("kind").and_then(Value::as_str) == Some("temp")
    }

    fn transform(&self, inbound: JsonMap) -> JsonMap {
        let mut out = JsonMap::new();
        if let Some(value) = inbound.get("value") {
            out.insert("celsius".into(), value.clone());
        }
        out
    }
}

// ─── Lifecycle probes ────────────────────────────────────────────

/// Shared recorder for lifecycle ordering assertions.
#[derive(Clone)]
pub struct LifecycleProbe {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl LifecycleProbe {
    fn mark(&self, phase: &str) {
        self.log.lock().unwrap().push(format!("{phase}:{}", self.name));
    }
}

pub struct LogPlugin(pub LifecycleProbe);

impl Component for LogPlugin {
    fn on_init(
        &mut self,
        _options: gantry_component::ComponentOptions,
        _ctx: &Context,
    ) -> Result<(), ComponentError> {
        self.0.mark("init");
        Ok(())
    }

    fn on_start(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.0.mark("start");
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.0.mark("stop");
        Ok(())
    }
}

impl Plugin for LogPlugin {}

pub struct LogOutput {
    pub probe: LifecycleProbe,
    pub codec: JsonCodec,
}

impl Component for LogOutput {
    fn on_init(
        &mut self,
        _options: gantry_component::ComponentOptions,
        _ctx: &Context,
    ) -> Result<(), ComponentError> {
        self.probe.mark("init");
        Ok(())
    }

    fn on_start(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.probe.mark("start");
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.probe.mark("stop");
        Ok(())
    }
}

#[async_trait]
impl gantry_component::OutputDevice for LogOutput {
    fn decoder(&self) -> &dyn Decoder {
        &self.codec
    }

    fn encoder(&self) -> &dyn Encoder {
        &self.codec
    }

    async fn process(
        &self,
        frame: FramePacket,
        _ctx: &Context,
    ) -> Result<FramePacket, ComponentError> {
        Ok(frame)
    }
}

pub struct LogDriver(pub LifecycleProbe);

impl Component for LogDriver {
    fn on_init(
        &mut self,
        _options: gantry_component::ComponentOptions,
        _ctx: &Context,
    ) -> Result<(), ComponentError> {
        self.0.mark("init");
        Ok(())
    }

    fn on_start(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.0.mark("start");
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.0.mark("stop");
        Ok(())
    }
}

#[async_trait]
impl Driver for LogDriver {
    async fn handle(
        &self,
        _session: &mut EventSession,
        _outputs: &dyn OutputDeliverer,
        _ctx: &Context,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

pub struct LogLogic(pub LifecycleProbe);

impl Component for LogLogic {
    fn on_init(
        &mut self,
        _options: gantry_component::ComponentOptions,
        _ctx: &Context,
    ) -> Result<(), ComponentError> {
        self.0.mark("init");
        Ok(())
    }

    fn on_start(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.0.mark("start");
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.0.mark("stop");
        Ok(())
    }
}

impl LogicDevice for LogLogic {
    fn check_if_match(&self, _inbound: &JsonMap) -> bool {
        false
    }

    fn transform(&self, inbound: JsonMap) -> JsonMap {
        inbound
    }
}

pub struct LogInput {
    pub probe: LifecycleProbe,
    pub codec: JsonCodec,
}

impl Component for LogInput {
    fn on_init(
        &mut self,
        _options: gantry_component::ComponentOptions,
        _ctx: &Context,
    ) -> Result<(), ComponentError> {
        self.probe.mark("init");
        Ok(())
    }

    fn on_start(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.probe.mark("start");
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.probe.mark("stop");
        Ok(())
    }
}

#[async_trait]
impl InputDevice for LogInput {
    fn decoder(&self) -> &dyn Decoder {
        &self.codec
    }

    fn encoder(&self) -> &dyn Encoder {
        &self.codec
    }

    async fn serve(
        &self,
        ctx: Context,
        _deliverer: Arc<dyn InputDeliverer>,
    ) -> Result<(), ComponentError> {
        ctx.shutdown().fired().await;
        Ok(())
    }
}
