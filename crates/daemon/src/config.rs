//! Daemon configuration: the single `EngineConfig` TOML file (spec
//! section 6) plus the socket path the wire listener binds, derived
//! from it the same way `Store::open` derives its snapshot path from
//! the WAL path.

use quaero_core::EngineConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_ENV_VAR: &str = "QUAERO_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./quaero.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Everything the daemon binary needs beyond what [`EngineConfig`]
/// already covers.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub engine: EngineConfig,
    pub socket_path: PathBuf,
}

impl DaemonConfig {
    /// Load from the path named by `QUAERO_CONFIG` (default
    /// `./quaero.toml`).
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let engine = load_engine_config(&path)?;
        let socket_path = socket_path_for(&engine.database_path);
        Ok(Self { engine, socket_path })
    }
}

/// Read and parse `path` into an [`EngineConfig`]. A missing file is not
/// an error — every field defaults to the value the spec states, so an
/// absent config is a valid one.
fn load_engine_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => EngineConfig::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(EngineConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn socket_path_for(database_path: &str) -> PathBuf {
    Path::new(database_path).with_extension("sock")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
