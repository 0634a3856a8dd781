//! Do-nothing driver.

use async_trait::async_trait;
use gantry_component::{
    Component, ComponentError, ComponentOptions, Context, Driver, HandlerError, OutputDeliverer,
};
use gantry_event::EventSession;
use tracing::debug;

/// Driver that matches its configured topics and does nothing.
///
/// Useful as a sink while wiring up inputs, and as the smallest
/// possible driver template.
#[derive(Debug, Default)]
pub struct NopDriver;

impl Component for NopDriver {
    fn on_init(
        &mut self,
        _options: ComponentOptions,
        _ctx: &Context,
    ) -> Result<(), ComponentError> {
        debug!("nop driver initialized");
        Ok(())
    }
}

#[async_trait]
impl Driver for NopDriver {
    async fn handle(
        &self,
        session: &mut EventSession,
        _outputs: &dyn OutputDeliverer,
        _ctx: &Context,
    ) -> Result<(), HandlerError> {
        debug!(topic = session.topic(), "nop driver swallowed event");
        Ok(())
    }
}
