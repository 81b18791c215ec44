//! JSON configuration for the engine.
//!
//! Every field is optional; missing fields take their defaults. The loaded
//! config is validated before it is returned.

use std::fmt;
use std::path::Path;

use lw_wire::EngineConfig;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(lw_core::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "reading config: {e}"),
            Self::Json(e) => write!(f, "parsing config: {e}"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

pub fn from_json(text: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = serde_json::from_str(text).map_err(ConfigError::Json)?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    from_json(&text)
}
