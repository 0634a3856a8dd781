//! Echo output device.

use async_trait::async_trait;
use gantry_component::{Component, ComponentError, Context, OutputDevice};
use gantry_event::{Decoder, Encoder, FramePacket, JsonCodec};

/// Output device that answers every request with the request itself.
///
/// Stands in for a real peripheral while wiring up drivers, and gives
/// tests a loopback target.
#[derive(Debug, Default)]
pub struct EchoOutput {
    codec: JsonCodec,
}

impl Component for EchoOutput {}

#[async_trait]
impl OutputDevice for EchoOutput {
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
