//! Device SDK for the Gantry pipeline.
//!
//! Everything a pluggable component needs to participate in the
//! pipeline lives here; the runtime crate consumes these contracts but
//! components never depend on the runtime.
//!
//! # Capability model
//!
//! Components implement any subset of the capability set by overriding
//! the default no-op methods on [`Component`]:
//!
//! ```text
//! Component (on_init / on_start / on_stop, all optional)
//!   ├── Plugin        : lifecycle only, no data path
//!   ├── InputDevice   : codec pair + long-running serve()
//!   ├── OutputDevice  : codec pair + process()
//!   └── LogicDevice   : payload match + transform, bound to an input
//!
//! Interceptor : Component + synchronous handle(), may drop the event
//! Driver      : Component + async handle(), may call output devices
//! ```
//!
//! Routing metadata (uuid, name, topic patterns, priority) comes from
//! configuration and is held by the runtime's registry, not by the
//! component itself, so implementations stay free of bookkeeping.
//!
//! # Deliverers
//!
//! Devices never touch the dispatcher directly. An input device calls
//! [`InputDeliverer::deliver`] to push a decoded frame through the
//! pipeline and await the encoded reply; a driver calls
//! [`OutputDeliverer::deliver`] to reach a named output device.
//!
//! # Example
//!
//! ```
//! use gantry_component::{Component, Context, HandlerError, Interceptor};
//! use gantry_event::EventSession;
//!
//! struct Stamp;
//!
//! impl Component for Stamp {}
//!
//! impl Interceptor for Stamp {
//!     fn handle(&self, session: &mut EventSession, _ctx: &Context) -> Result<(), HandlerError> {
//!         session.add_attribute("stamped", true);
//!         Ok(())
//!     }
//! }
//! ```

mod component;
mod context;
mod deliverer;
mod device;
mod error;
mod handler;
mod options;

pub use component::Component;
pub use context::{
    ConfigSection, Context, ContextBuilder, EngineSettings, ShutdownSignal, LIFECYCLE_TIMEOUT,
};
pub use deliverer::{InputDeliverer, OutputDeliverer};
pub use device::{InputDevice, LogicDevice, OutputDevice, Plugin};
pub use error::{ComponentError, DeliverError, HandlerError};
pub use handler::{Driver, Interceptor};
pub use options::ComponentOptions;

// Re-export the event model for convenience: a device implementation
// only needs this crate in its dependency table.
pub use gantry_event::{
    CodecError, Decoder, Encoder, EventSession, FramePacket, JsonCodec, JsonMap, MessagePacket,
};
