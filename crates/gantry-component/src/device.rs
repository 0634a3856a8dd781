//! Device roles: plugins, inputs, outputs, logic devices.

use crate::{Component, ComponentError, Context, InputDeliverer};
use async_trait::async_trait;
use gantry_event::{Decoder, Encoder, FramePacket, JsonMap};
use std::sync::Arc;

/// A component with lifecycle only, no data path.
///
/// Plugins exist for side effects: exporters, watchdogs, house-keeping
/// tasks that start and stop with the pipeline.
pub trait Plugin: Component {}

/// A device that receives external stimuli and originates events.
///
/// The runtime spawns one task per input after start and runs
/// [`serve`](Self::serve) until it returns. The device decodes nothing
/// itself; it hands raw frames to the deliverer, which applies the
/// device's codec pair.
#[async_trait]
pub trait InputDevice: Component {
    /// Codec used to decode request frames from this device.
    fn decoder(&self) -> &dyn Decoder;

    /// Codec used to encode reply frames for this device.
    fn encoder(&self) -> &dyn Encoder;

    /// Long-running accept loop.
    ///
    /// Implementations must remain interruptible: select on
    /// `ctx.shutdown().fired()` or an internal stop flag toggled by
    /// `on_stop`, and return promptly when either fires. `serve` must
    /// tolerate `on_stop` running concurrently.
    ///
    /// # Errors
    ///
    /// `Ok(())` on graceful stop; [`ComponentError::ServeFailed`] (or
    /// any other variant) on abnormal exit. The error is logged by the
    /// supervisor, not retried.
    async fn serve(
        &self,
        ctx: Context,
        deliverer: Arc<dyn InputDeliverer>,
    ) -> Result<(), ComponentError>;
}

/// A device that talks to a downstream peripheral.
///
/// Resolved by uuid through the output deliverer. `process` is a
/// synchronous request/response exchange from the driver's point of
/// view; any internal queueing or retry is the device's business.
#[async_trait]
pub trait OutputDevice: Component {
    /// Codec used to decode the device's response frames.
    fn decoder(&self) -> &dyn Decoder;

    /// Codec used to encode request frames for the device.
    fn encoder(&self) -> &dyn Encoder;

    /// Sends one encoded frame to the peripheral and returns its raw
    /// response frame.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::ProcessFailed`] (typically) when the
    /// exchange fails; the deliverer wraps it with the device uuid.
    async fn process(&self, frame: FramePacket, ctx: &Context)
        -> Result<FramePacket, ComponentError>;
}

/// An optional child of an input device that rewrites payload and
/// routing.
///
/// After decoding, the input deliverer asks each logic device attached
/// to the originating input, in registration order, whether the payload
/// is its business. The first match takes over: the session is
/// retargeted to the logic device's `(topic, uuid)` and the payload
/// goes through [`transform`](Self::transform).
pub trait LogicDevice: Component {
    /// Returns `true` when this device claims the decoded payload.
    fn check_if_match(&self, inbound: &JsonMap) -> bool;

    /// Reshapes the claimed payload.
    fn transform(&self, inbound: JsonMap) -> JsonMap;
}
