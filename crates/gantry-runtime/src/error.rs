//! Pipeline construction errors.

use crate::config::ConfigError;
use crate::factory::ComponentKind;
use gantry_component::ComponentError;
use gantry_types::ErrorCode;
use thiserror::Error;

/// Error raised while building or registering the pipeline.
///
/// Everything here is fatal to construction: the pipeline either comes
/// up whole or not at all. Runtime faults (handler errors, panics) are
/// not errors in this sense; they go through the fail-fast policy.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration tree is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configuration entry names a component type no factory was
    /// registered for.
    #[error("unknown component type '{0}'")]
    UnknownType(String),

    /// A factory was registered twice under the same type name.
    #[error("component type '{0}' already registered")]
    DuplicateType(String),

    /// The factory produced a component of the wrong role for the
    /// section it was configured under.
    #[error("component '{name}' (type '{type_name}') is a {actual}, section requires a {expected}")]
    KindMismatch {
        name: String,
        type_name: String,
        expected: ComponentKind,
        actual: ComponentKind,
    },

    /// A component's `on_init` rejected its options.
    #[error("initialization of '{name}' failed: {source}")]
    Init {
        name: String,
        #[source]
        source: ComponentError,
    },

    /// Two output devices share a uuid.
    #[error("duplicate output device uuid '{0}'")]
    DuplicateUuid(String),

    /// A logic device references an input that does not exist.
    #[error("logic device '{name}' references unknown input '{input_uuid}'")]
    UnknownInput { name: String, input_uuid: String },
}

impl ErrorCode for PipelineError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "PIPELINE_CONFIG_INVALID",
            Self::UnknownType(_) => "PIPELINE_UNKNOWN_TYPE",
            Self::DuplicateType(_) => "PIPELINE_DUPLICATE_TYPE",
            Self::KindMismatch { .. } => "PIPELINE_KIND_MISMATCH",
            Self::Init { .. } => "PIPELINE_INIT_FAILED",
            Self::DuplicateUuid(_) => "PIPELINE_DUPLICATE_UUID",
            Self::UnknownInput { .. } => "PIPELINE_UNKNOWN_INPUT",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Construction failures require a config or code change.
        false
    }
}
