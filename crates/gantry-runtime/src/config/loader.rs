//! TOML configuration loader.

use super::{ConfigError, PipelineConfig};
use std::path::Path;
use tracing::info;

/// Loads and validates a configuration tree from a TOML file.
///
/// # Errors
///
/// [`ConfigError::Io`] when the file cannot be read, otherwise the
/// parse/validation errors of [`load_str`].
pub fn load_file(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = load_str(&text)?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses and validates a configuration tree from TOML text.
///
/// # Errors
///
/// [`ConfigError::Parse`] on malformed TOML or entries, plus everything
/// [`PipelineConfig::validate`] rejects.
pub fn load_str(text: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}
