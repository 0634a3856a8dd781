//! Codec contract between frames and decoded payloads.
//!
//! Every input and output device owns a decoder and an encoder. The
//! default pair is [`JsonCodec`]: UTF-8 JSON objects on the wire. For
//! the structural subset JSON supports, `decode(encode(x)) == x`.

use crate::packet::{FramePacket, JsonMap};
use gantry_types::ErrorCode;
use serde_json::Value;
use thiserror::Error;

/// Codec failure, surfaced to the caller of the deliverer.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The frame could not be decoded into a payload mapping.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The payload mapping could not be encoded into a frame.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl ErrorCode for CodecError {
    fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "CODEC_DECODE_FAILED",
            Self::Encode(_) => "CODEC_ENCODE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Malformed data stays malformed on retry.
        false
    }
}

/// Turns a raw frame into a decoded payload mapping.
pub trait Decoder: Send + Sync {
    /// Decodes `frame` into a field/value mapping.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] when the frame is not a valid
    /// representation of a mapping.
    fn decode(&self, frame: &FramePacket) -> Result<JsonMap, CodecError>;
}

/// Turns a decoded payload mapping into a raw frame.
pub trait Encoder: Send + Sync {
    /// Encodes `data` into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when the mapping cannot be
    /// serialized.
    fn encode(&self, data: &JsonMap) -> Result<FramePacket, CodecError>;
}

/// Default codec: UTF-8 JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Decoder for JsonCodec {
    fn decode(&self, frame: &FramePacket) -> Result<JsonMap, CodecError> {
        let value: Value = serde_json::from_slice(frame.data())
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(CodecError::Decode(format!(
                "frame is not a JSON object: {other}"
            ))),
        }
    }
}

impl Encoder for JsonCodec {
    fn encode(&self, data: &JsonMap) -> Result<FramePacket, CodecError> {
        let bytes =
            serde_json::to_vec(data).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(FramePacket::new(bytes))
    }
}
