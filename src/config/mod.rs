//! Engine settings module
//!
//! Provides unified configuration with:
//! - Builder pattern
//! - JSON loading
//! - Validated thresholds

pub mod config;

pub use config::{ConfigError, EngineConfig, EngineConfigBuilder};
