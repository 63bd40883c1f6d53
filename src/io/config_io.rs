use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::config::EngineConfig;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "gtd.toml";

/// Error type for reading engine options
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Read engine options from a TOML file. Missing sections take defaults.
pub fn read_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: EngineConfig = toml::from_str(&text)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load the given file, or `gtd.toml` in the working directory if it
/// exists, or fall back to the defaults.
///
/// An explicitly named file must exist; the implicit one is optional.
pub fn load_config_or_default(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    match path {
        Some(path) => read_config(path),
        None => {
            let implicit = Path::new(DEFAULT_CONFIG_FILE);
            if implicit.is_file() {
                read_config(implicit)
            } else {
                Ok(EngineConfig::default())
            }
        }
    }
}
