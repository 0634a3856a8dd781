//! Deliverer contracts: how devices enter and exit the pipeline.

use crate::DeliverError;
use async_trait::async_trait;
use gantry_event::{FramePacket, JsonMap};

/// Entry point an input device uses to push a raw frame through the
/// pipeline and await the encoded reply.
///
/// One deliverer is bound to one input device; the runtime hands it to
/// the device's `serve`. Concurrent calls from the same device are
/// independent and interleave freely through the dispatcher.
///
/// Back-pressure: when the dispatcher's admission queue is full,
/// `deliver` blocks in the send until a slot frees up. That is the only
/// admission control in the system.
#[async_trait]
pub trait InputDeliverer: Send + Sync {
    /// Delivers one request frame on `topic`, returning the encoded
    /// response frame.
    ///
    /// # Errors
    ///
    /// - [`DeliverError::MissingPayload`] for an empty frame
    /// - [`DeliverError::Codec`] when the input's codec rejects the
    ///   frame or the reply
    /// - [`DeliverError::EmptyResponse`] when the pipeline completed
    ///   the session without a payload
    /// - [`DeliverError::Shutdown`] when the pipeline no longer admits
    ///   sessions
    async fn deliver(&self, topic: &str, frame: FramePacket)
        -> Result<FramePacket, DeliverError>;
}

/// Exit point a driver uses to reach a named output device.
#[async_trait]
pub trait OutputDeliverer: Send + Sync {
    /// Sends `data` to the output device registered under `uuid` and
    /// returns its decoded response.
    ///
    /// # Errors
    ///
    /// - [`DeliverError::UnknownOutput`] when no device has the uuid
    /// - [`DeliverError::Codec`] when the device's codec fails
    /// - [`DeliverError::Process`] when the device itself fails
    async fn deliver(&self, uuid: &str, data: JsonMap) -> Result<JsonMap, DeliverError>;
}
