//! Configuration errors.

use gantry_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised while loading or validating the configuration tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML text does not parse into the expected tree.
    #[error("config parse failed: {0}")]
    Parse(#[from] toml::de::Error),

    /// `events_capacity` must admit at least one session.
    #[error("engine.events_capacity must be at least 1")]
    ZeroCapacity,

    /// Two output device entries share a uuid.
    #[error("duplicate output device uuid '{0}'")]
    DuplicateUuid(String),

    /// A logic entry lacks the mandatory parent input reference.
    #[error("logic device '{0}' must declare input_uuid")]
    MissingInputUuid(String),

    /// A logic entry names a parent input that is not configured.
    #[error("logic device '{name}' references unknown input '{input_uuid}'")]
    UnknownInput { name: String, input_uuid: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CONFIG_IO_FAILED",
            Self::Parse(_) => "CONFIG_PARSE_FAILED",
            Self::ZeroCapacity => "CONFIG_ZERO_CAPACITY",
            Self::DuplicateUuid(_) => "CONFIG_DUPLICATE_UUID",
            Self::MissingInputUuid(_) => "CONFIG_MISSING_INPUT_UUID",
            Self::UnknownInput { .. } => "CONFIG_UNKNOWN_INPUT",
        }
    }

    fn is_recoverable(&self) -> bool {
        // A transient filesystem problem may clear; the rest needs an
        // edited config.
        matches!(self, Self::Io { .. })
    }
}
