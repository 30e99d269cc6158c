//! PrintView Settings Crate
//!
//! Loads, validates and saves the viewer configuration.

pub mod config;
pub mod error;

pub use config::{default_config_path, ParseSettings, RenderSettings, ViewerConfig, WorkerSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
