//! Configuration module for repolens
//!
//! This module handles:
//! - Project-level engine configuration (repolens.toml)
//! - User-level LLM credentials (~/.config/repolens/config.toml)

mod project_config;
mod user_config;

pub use project_config::{
    load_config, load_config_file, CliDefaults, EngineConfig, LlmSettings, CONFIG_FILE_JSON,
    CONFIG_FILE_TOML, EXAMPLE_CONFIG,
};
pub use user_config::{LlmCredentials, UserConfig};
