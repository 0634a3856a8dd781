//! Interval-driven input device.

use async_trait::async_trait;
use gantry_component::{
    Component, ComponentError, ComponentOptions, Context, InputDeliverer, InputDevice,
    ShutdownSignal,
};
use gantry_event::{Decoder, Encoder, JsonCodec, JsonMap};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TimerOptions {
    interval_ms: u64,
    topic: String,
    payload: JsonMap,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            topic: "/timer".to_string(),
            payload: JsonMap::new(),
        }
    }
}

/// Input device that emits a fixed payload on a fixed topic every
/// `interval_ms`.
///
/// Options: `interval_ms` (default 1000), `topic` (default `/timer`),
/// `payload` (default empty map). The serve loop stops on the pipeline
/// shutdown signal or on `on_stop`, whichever fires first.
#[derive(Debug)]
pub struct TimerInput {
    codec: JsonCodec,
    interval: Duration,
    topic: String,
    payload: JsonMap,
    stop: ShutdownSignal,
}

impl Default for TimerInput {
    fn default() -> Self {
        let options = TimerOptions::default();
        Self {
            codec: JsonCodec,
            interval: Duration::from_millis(options.interval_ms),
            topic: options.topic,
            payload: options.payload,
            stop: ShutdownSignal::new(),
        }
    }
}

impl Component for TimerInput {
    fn on_init(
        &mut self,
        options: ComponentOptions,
        _ctx: &Context,
    ) -> Result<(), ComponentError> {
        let options: TimerOptions = options.decode()?;
        self.interval = Duration::from_millis(options.interval_ms.max(1));
        self.topic = options.topic;
        self.payload = options.payload;
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), ComponentError> {
        self.stop.fire();
        Ok(())
    }
}

#[async_trait]
impl InputDevice for TimerInput {
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
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(topic = %self.topic, interval_ms = self.interval.as_millis() as u64, "timer input serving");

        loop {
            tokio::select! {
                _ = ctx.shutdown().fired() => break,
                _ = self.stop.fired() => break,
                _ = ticker.tick() => {
                    let frame = match self.codec.encode(&self.payload) {
                        Ok(frame) => frame,
                        Err(err) => {
                            warn!(error = %err, "timer payload does not encode, tick skipped");
                            continue;
                        }
                    };
                    match deliverer.deliver(&self.topic, frame).await {
                        Ok(_reply) => ctx.on_if_log_verbose(|| {
                            debug!(topic = %self.topic, "timer tick delivered");
                        }),
                        Err(err) => warn!(topic = %self.topic, error = %err, "timer tick rejected"),
                    }
                }
            }
        }
        Ok(())
    }
}
