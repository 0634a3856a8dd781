//! Component, handler and deliverer errors.
//!
//! # Error Code Convention
//!
//! | Layer | Prefix |
//! |-------|--------|
//! | Component lifecycle | `COMPONENT_` |
//! | Interceptor/driver handlers | `HANDLER_` |
//! | Input/output deliverers | `DELIVER_` |

use gantry_event::CodecError;
use gantry_types::ErrorCode;
use thiserror::Error;

/// Failure of a component lifecycle or processing call.
#[derive(Debug, Clone, Error)]
pub enum ComponentError {
    /// `on_init` rejected its configuration.
    #[error("initialization failed: {0}")]
    InitFailed(String),

    /// The option map could not be decoded into the component's
    /// configuration struct.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// `on_start` failed.
    #[error("start failed: {0}")]
    StartFailed(String),

    /// `on_stop` failed.
    #[error("stop failed: {0}")]
    StopFailed(String),

    /// An input device's serve loop terminated abnormally.
    #[error("serve terminated: {0}")]
    ServeFailed(String),

    /// An output device failed to process a frame.
    #[error("process failed: {0}")]
    ProcessFailed(String),
}

impl ErrorCode for ComponentError {
    fn code(&self) -> &'static str {
        match self {
            Self::InitFailed(_) => "COMPONENT_INIT_FAILED",
            Self::InvalidOptions(_) => "COMPONENT_INVALID_OPTIONS",
            Self::StartFailed(_) => "COMPONENT_START_FAILED",
            Self::StopFailed(_) => "COMPONENT_STOP_FAILED",
            Self::ServeFailed(_) => "COMPONENT_SERVE_FAILED",
            Self::ProcessFailed(_) => "COMPONENT_PROCESS_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Transport-facing calls may succeed on retry; config problems
        // will not.
        matches!(
            self,
            Self::StartFailed(_) | Self::ServeFailed(_) | Self::ProcessFailed(_)
        )
    }
}

/// Result of an interceptor or driver handling a session.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// Sentinel: the interceptor terminates the session. No further
    /// interceptor or driver runs; the reply is delivered with
    /// `error="InterceptorDropped"`.
    #[error("event dropped by interceptor")]
    Dropped,

    /// The handler failed; the chain continues (or the process exits,
    /// under fail-fast).
    #[error("handler failed: {0}")]
    Failed(String),

    /// A deliverer call made by the handler failed.
    #[error(transparent)]
    Deliver(#[from] DeliverError),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl ErrorCode for HandlerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Dropped => "HANDLER_DROPPED",
            Self::Failed(_) => "HANDLER_FAILED",
            Self::Deliver(_) => "HANDLER_DELIVER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Dropped => false,
            Self::Failed(_) => true,
            Self::Deliver(inner) => inner.is_recoverable(),
        }
    }
}

/// Failure of an input or output deliverer call.
///
/// Every variant that involves a device names its uuid, so a log line
/// carries enough context to find the misbehaving peripheral.
#[derive(Debug, Clone, Error)]
pub enum DeliverError {
    /// The request frame carried no payload bytes.
    #[error("request frame carries no payload")]
    MissingPayload,

    /// The pipeline completed the session without a payload.
    #[error("pipeline returned no response")]
    EmptyResponse,

    /// No output device registered under the uuid.
    #[error("no output device with uuid '{0}'")]
    UnknownOutput(String),

    /// Encode or decode failed for the named device.
    #[error("codec failure for device '{uuid}': {source}")]
    Codec {
        uuid: String,
        #[source]
        source: CodecError,
    },

    /// The named output device failed to process the frame.
    #[error("output device '{uuid}' failed: {source}")]
    Process {
        uuid: String,
        #[source]
        source: ComponentError,
    },

    /// The pipeline is shutting down and no longer admits sessions.
    #[error("pipeline is shutting down")]
    Shutdown,
}

impl ErrorCode for DeliverError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingPayload => "DELIVER_MISSING_PAYLOAD",
            Self::EmptyResponse => "DELIVER_EMPTY_RESPONSE",
            Self::UnknownOutput(_) => "DELIVER_UNKNOWN_OUTPUT",
            Self::Codec { .. } => "DELIVER_CODEC_FAILED",
            Self::Process { .. } => "DELIVER_PROCESS_FAILED",
            Self::Shutdown => "DELIVER_SHUTDOWN",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Process { .. } | Self::Shutdown)
    }
}
