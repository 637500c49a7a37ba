// src/utils/config.rs
//! Layered configuration
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. `egress-classifier.toml` in the working directory, or the file named by
//!    `EGRESS_CLASSIFIER_CONFIG`
//! 3. Environment variables, e.g. `EGRESS_CLASSIFIER__STATS__LISTEN_ADDR`
//!
//! Everything is read once at startup. Nothing here can be changed while the
//! engine is running.

use crate::classifier::ClassLabel;
use crate::threshold::ThresholdTable;
use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "egress-classifier.toml";

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "EGRESS_CLASSIFIER_CONFIG";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "EGRESS_CLASSIFIER";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: ThresholdsConfig,
    pub signals: SignalsConfig,
    pub stats: StatsConfig,
    pub replay: ReplayConfig,
    pub observability: ObservabilityConfig,
}

/// Per-class shaping thresholds
///
/// There is deliberately no entry for unknown IPv4 classes: they never shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub class_a: u64,
    pub class_b: u64,
    pub class_c: u64,
    pub ipv6: u64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            class_a: 15,
            class_b: 10,
            class_c: 7,
            ipv6: 5,
        }
    }
}

impl ThresholdsConfig {
    /// Threshold entries paired with the label they apply to
    pub fn entries(&self) -> [(ClassLabel, u64); 4] {
        [
            (ClassLabel::ClassA, self.class_a),
            (ClassLabel::ClassB, self.class_b),
            (ClassLabel::ClassC, self.class_c),
            (ClassLabel::V6, self.ipv6),
        ]
    }
}

/// Shaping signal delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Bounded queue size; signals beyond this are dropped
    pub queue_capacity: usize,

    /// How often the dispatcher drains the queue (milliseconds)
    pub drain_interval_ms: u64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4096,
            drain_interval_ms: 100,
        }
    }
}

/// Read-only stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub enabled: bool,
    pub listen_addr: SocketAddr,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9464)),
        }
    }
}

/// Trace replay feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Trace file to replay, `-` for stdin. No replay when unset.
    pub source: Option<PathBuf>,

    /// Worker threads invoking the engine concurrently
    pub workers: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            source: None,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Logging setup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::load_from(&path)
    }

    /// Load configuration from `path` (optional) and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        ThresholdTable::from_config(&self.thresholds)?;

        if self.signals.queue_capacity == 0 {
            return Err(EngineError::ConfigError(
                "signals.queue_capacity cannot be 0".to_string(),
            ));
        }

        if self.signals.drain_interval_ms == 0 {
            return Err(EngineError::ConfigError(
                "signals.drain_interval_ms cannot be 0".to_string(),
            ));
        }

        if self.replay.workers == 0 {
            return Err(EngineError::ConfigError(
                "replay.workers cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
