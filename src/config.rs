//! Configuration system using Figment.
//!
//! Configuration is loaded from:
//! 1. a TOML file (`config/biosignal.toml` by default)
//! 2. environment variables prefixed with `BIOSIGNAL_`
//!
//! # Example
//! ```no_run
//! use biosignal_daq::config::AcqConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AcqConfig::load()?;
//! println!("Application: {}", config.application.name);
//! # Ok(())
//! # }
//! ```

use crate::error::{AcqError, AcqResult};
use crate::frame::{FrameLayout, Framing};
use crate::pipeline::ingest::QueuePolicy;
use crate::pipeline::rotation::RotationPolicy;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcqConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Storage and flushing settings
    pub storage: StorageConfig,
    /// Device stream definitions
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Storage and flush-cycle configuration shared by all streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory CSV files are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Flush-cycle period in milliseconds
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
}

/// One device stream: where frames come from and how they are decoded,
/// queued, and rotated into files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Unique stream identifier
    pub id: String,
    /// Advertised device name the transport scans for
    pub device_name: String,
    /// File-name prefix identifying this stream (e.g. "OpenEarableEEG")
    pub file_prefix: String,
    /// Binary layout of the stream's frames
    pub layout: FrameLayout,
    /// How raw deliveries map to frames
    #[serde(default)]
    pub framing: Framing,
    /// When to start a new output file
    #[serde(default)]
    pub rotation: RotationPolicy,
    /// Ingest queue capacity and overflow policy
    #[serde(default)]
    pub queue: QueuePolicy,
    /// Whether a link drop triggers a new scan automatically
    #[serde(default)]
    pub auto_rescan: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_batch_interval_ms() -> u64 {
    1000
}

impl AcqConfig {
    /// Load configuration from `config/biosignal.toml` and environment
    /// variables.
    ///
    /// Environment variables can override configuration with prefix
    /// `BIOSIGNAL_`, e.g. `BIOSIGNAL_APPLICATION_LOG_LEVEL=debug`.
    pub fn load() -> AcqResult<Self> {
        Self::load_from("config/biosignal.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AcqResult<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BIOSIGNAL_").split("_"))
            .extract()
            .map_err(AcqError::Config)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> AcqResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(AcqError::Validation(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.storage.batch_interval_ms == 0 {
            return Err(AcqError::Validation(
                "batch_interval_ms must be greater than 0".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for stream in &self.streams {
            if !ids.insert(&stream.id) {
                return Err(AcqError::Validation(format!(
                    "Duplicate stream ID: {}",
                    stream.id
                )));
            }
            if stream.file_prefix.is_empty() {
                return Err(AcqError::Validation(format!(
                    "Stream '{}' has an empty file_prefix",
                    stream.id
                )));
            }
            if stream.layout.readings() == 0 {
                return Err(AcqError::Validation(format!(
                    "Stream '{}' declares a layout with 0 readings",
                    stream.id
                )));
            }
            if let RotationPolicy::EntryCount {
                max_entries_per_file,
            } = stream.rotation
            {
                if max_entries_per_file == 0 {
                    return Err(AcqError::Validation(format!(
                        "Stream '{}': max_entries_per_file must be greater than 0",
                        stream.id
                    )));
                }
            }
            if let QueuePolicy::Bounded { capacity, .. } = stream.queue {
                if capacity == 0 {
                    return Err(AcqError::Validation(format!(
                        "Stream '{}': queue capacity must be greater than 0",
                        stream.id
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingest::OverflowPolicy;

    fn base_config() -> AcqConfig {
        AcqConfig {
            application: ApplicationConfig {
                name: "biosignal-daq".to_string(),
                log_level: "info".to_string(),
            },
            storage: StorageConfig {
                output_dir: PathBuf::from("data"),
                batch_interval_ms: 1000,
            },
            streams: vec![StreamConfig {
                id: "eeg".to_string(),
                device_name: "OpenEarable".to_string(),
                file_prefix: "OpenEarableEEG".to_string(),
                layout: FrameLayout::Plain { readings: 5 },
                framing: Framing::Datagram,
                rotation: RotationPolicy::default(),
                queue: QueuePolicy::default(),
                auto_rescan: false,
            }],
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_log_level() {
        let mut config = base_config();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_batch_interval() {
        let mut config = base_config();
        config.storage.batch_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_stream_ids() {
        let mut config = base_config();
        config.streams.push(config.streams[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_capacity_queue() {
        let mut config = base_config();
        config.streams[0].queue = QueuePolicy::Bounded {
            capacity: 0,
            on_full: OverflowPolicy::DropNewest,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_stream_from_toml() {
        let toml = r#"
            [application]
            name = "biosignal-daq"

            [storage]
            output_dir = "out"

            [[streams]]
            id = "eeg"
            device_name = "OpenEarable"
            file_prefix = "OpenEarableEEG"
            layout = { kind = "plain", readings = 5 }
            rotation = { strategy = "entry-count", max_entries_per_file = 20000 }
        "#;
        let config: AcqConfig = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .unwrap();
        assert_eq!(config.storage.batch_interval_ms, 1000);
        assert_eq!(config.streams[0].layout, FrameLayout::Plain { readings: 5 });
        assert_eq!(
            config.streams[0].rotation,
            RotationPolicy::EntryCount {
                max_entries_per_file: 20000
            }
        );
        assert_eq!(config.streams[0].queue, QueuePolicy::Unbounded);
    }
}
