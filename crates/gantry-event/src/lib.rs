//! Event model for the Gantry pipeline.
//!
//! Everything that travels through the pipeline is defined here:
//!
//! - [`FramePacket`]: the opaque byte frame at the transport boundary
//! - [`JsonMap`]: the decoded field/value mapping
//! - [`MessagePacket`]: a topic plus its decoded payload
//! - [`Decoder`] / [`Encoder`]: the codec contract, with [`JsonCodec`]
//!   as the default implementation
//! - [`EventSession`]: the envelope of one in-flight event, carrying
//!   the inbound and outbound messages, a mutable attribute bag and the
//!   single-use reply channel back to the originating input
//!
//! # Session lifecycle
//!
//! ```text
//! InputDevice ──frame──▶ decode ──▶ EventSession ──▶ dispatcher
//!                                        │
//!     encode ◀── reply channel ◀── complete(outbound)
//! ```
//!
//! A session is created by the input deliverer, owned by exactly one
//! pipeline worker at a time, and completed exactly once: normal
//! completion, interceptor drop, and fault all end in
//! [`EventSession::complete`].

mod codec;
mod packet;
mod session;

pub use codec::{CodecError, Decoder, Encoder, JsonCodec};
pub use packet::{FramePacket, JsonMap, MessagePacket};
pub use session::{EventSession, ReplyReceiver};
