//! Recognized configuration options (spec section 6). Parsed once at
//! daemon startup from a single TOML file; every field defaults to the
//! value stated in the spec so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    pub concurrency: usize,
    #[serde(with = "duration_secs")]
    pub visibility_timeout: Duration,
    pub max_receive: u32,
    pub queue_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            concurrency: 5,
            visibility_timeout: Duration::from_secs(5 * 60),
            max_receive: 3,
            queue_name: "quaero".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub batch_size: usize,
    #[serde(with = "duration_secs")]
    pub batch_interval: Duration,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub queue: QueueConfig,
    #[serde(with = "duration_secs")]
    pub stall_threshold: Duration,
    pub log: LogConfig,
    /// Path to the single database file (spec section 6: "single
    /// database file path; backup is a file copy").
    pub database_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            stall_threshold: Duration::from_secs(15 * 60),
            log: LogConfig::default(),
            database_path: "quaero.wal".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
