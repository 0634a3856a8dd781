//! Packet types carried through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded field/value mapping: the structured payload of every event.
///
/// Values are plain JSON values (scalars, lists, nested maps); insertion
/// order is not significant.
pub type JsonMap = serde_json::Map<String, Value>;

/// Opaque byte frame at the transport boundary.
///
/// Input devices hand frames to the pipeline and receive frames back;
/// output devices receive frames and answer with frames. The pipeline
/// never interprets the bytes; that is the codec's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePacket(Vec<u8>);

impl FramePacket {
    /// Wraps raw bytes in a frame.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw frame bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the frame, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns `true` when the frame carries no payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Frame length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for FramePacket {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for FramePacket {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for FramePacket {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// A routing topic paired with its decoded payload.
///
/// Every session carries two of these: the inbound request and the
/// outbound response buffer that interceptors and drivers fill in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePacket {
    /// Routing topic.
    pub topic: String,
    /// Decoded payload fields.
    pub data: JsonMap,
}

impl MessagePacket {
    /// Creates a message for `topic` with the given payload.
    #[must_use]
    pub fn new(topic: impl Into<String>, data: JsonMap) -> Self {
        Self {
            topic: topic.into(),
            data,
        }
    }

    /// Creates a message for `topic` with an empty payload.
    #[must_use]
    pub fn empty(topic: impl Into<String>) -> Self {
        Self::new(topic, JsonMap::new())
    }

    /// Inserts a payload field, replacing any previous value.
    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }
}
