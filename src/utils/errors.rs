// src/utils/errors.rs
//! Error types for the classifier
//!
//! The classification path itself cannot fail. These errors only surface at
//! the edges: configuration, trace I/O, the stats endpoint and subscriber
//! installation.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EngineError>;

/// Classifier errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A threshold value was rejected
    #[error("Invalid threshold for {label}: {reason}")]
    InvalidThreshold { label: String, reason: String },

    /// Trace replay could not be completed
    #[error("Replay failed: {0}")]
    ReplayFailed(String),

    /// The stats endpoint could not be started
    #[error("Stats server failed: {0}")]
    StatsServerFailed(String),

    /// Tracing or metrics could not be installed
    #[error("Observability setup failed: {0}")]
    ObservabilityFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for EngineError {
    fn from(err: ::config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}
