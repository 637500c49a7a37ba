// src/utils/mod.rs
//! Common utilities: configuration loading and the crate error type

pub mod config;
pub mod errors;

pub use config::EngineConfig;
pub use errors::{EngineError, Result};
