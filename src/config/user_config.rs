//! User-level configuration for repolens
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/repolens/config.toml

use crate::ai::LlmBackend;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub llm: LlmCredentials,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmCredentials {
    pub anthropic_api_key: Option<String>,

    pub openai_api_key: Option<String>,

    pub openrouter_api_key: Option<String>,

    /// Backend used when the project config names none
    pub backend: Option<LlmBackend>,

    /// Default model to use
    pub model: Option<String>,

    /// Ollama URL (default: http://localhost:11434)
    pub ollama_url: Option<String>,

    pub ollama_model: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/repolens/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            config.merge(user_config);
        }

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("repolens").join("config.toml"))
    }

    /// Environment variables override everything
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("ANTHROPIC_API_KEY") {
            self.llm.anthropic_api_key = Some(key);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key);
        }
        if let Some(key) = var("OPENROUTER_API_KEY") {
            self.llm.openrouter_api_key = Some(key);
        }
        if let Some(model) = var("OLLAMA_MODEL") {
            self.llm.ollama_model = Some(model);
        }
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        let other = other.llm;
        if other.anthropic_api_key.is_some() {
            self.llm.anthropic_api_key = other.anthropic_api_key;
        }
        if other.openai_api_key.is_some() {
            self.llm.openai_api_key = other.openai_api_key;
        }
        if other.openrouter_api_key.is_some() {
            self.llm.openrouter_api_key = other.openrouter_api_key;
        }
        if other.backend.is_some() {
            self.llm.backend = other.backend;
        }
        if other.model.is_some() {
            self.llm.model = other.model;
        }
        if other.ollama_url.is_some() {
            self.llm.ollama_url = other.ollama_url;
        }
        if other.ollama_model.is_some() {
            self.llm.ollama_model = other.ollama_model;
        }
    }

    /// API key for `backend`; Ollama needs none
    pub fn api_key_for(&self, backend: LlmBackend) -> Option<&str> {
        match backend {
            LlmBackend::Anthropic => self.llm.anthropic_api_key.as_deref(),
            LlmBackend::OpenAi => self.llm.openai_api_key.as_deref(),
            LlmBackend::OpenRouter => self.llm.openrouter_api_key.as_deref(),
            LlmBackend::Ollama => Some("ollama"),
        }
    }

    pub fn backend(&self) -> LlmBackend {
        self.llm.backend.unwrap_or_default()
    }

    /// Model for `backend`, if the user picked one
    pub fn model_for(&self, backend: LlmBackend) -> Option<&str> {
        match backend {
            LlmBackend::Ollama => self.llm.ollama_model.as_deref().or(self.llm.model.as_deref()),
            _ => self.llm.model.as_deref(),
        }
    }

    /// Ollama endpoint override
    pub fn ollama_url(&self) -> Option<String> {
        self.llm
            .ollama_url
            .as_deref()
            .map(|base| format!("{}/v1/chat/completions", base.trim_end_matches('/')))
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# repolens user configuration

[llm]
# Backend: "anthropic" (default), "openai", "openrouter" or "ollama" (local)
# backend = "anthropic"

# Get a key from: https://console.anthropic.com/
# anthropic_api_key = "sk-ant-..."

# openai_api_key = "sk-..."
# openrouter_api_key = "sk-or-..."

# For Ollama (free, runs locally)
# ollama_url = "http://localhost:11434"
# ollama_model = "llama3.3:70b"
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert_eq!(config.backend(), LlmBackend::Anthropic);
        assert!(config.api_key_for(LlmBackend::Anthropic).is_none());
        assert_eq!(config.api_key_for(LlmBackend::Ollama), Some("ollama"));
        assert!(config.ollama_url().is_none());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[llm]
openrouter_api_key = "sk-or-test"
backend = "openrouter"
model = "some/model"
ollama_url = "http://gpu-box:11434/"
"#;
        let config: UserConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend(), LlmBackend::OpenRouter);
        assert_eq!(config.api_key_for(LlmBackend::OpenRouter), Some("sk-or-test"));
        assert_eq!(config.model_for(LlmBackend::OpenRouter), Some("some/model"));
        assert_eq!(
            config.ollama_url().as_deref(),
            Some("http://gpu-box:11434/v1/chat/completions")
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: UserConfig = toml::from_str(
            r#"
[llm]
anthropic_api_key = "from-file"
ollama_model = "codellama"
"#,
        )
        .unwrap();
        config.apply_env(|name| match name {
            "ANTHROPIC_API_KEY" => Some("from-env".to_string()),
            "OLLAMA_MODEL" => Some("qwen2.5".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key_for(LlmBackend::Anthropic), Some("from-env"));
        assert_eq!(config.model_for(LlmBackend::Ollama), Some("qwen2.5"));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base: UserConfig = toml::from_str("[llm]\nopenai_api_key = \"a\"").unwrap();
        let other: UserConfig = toml::from_str("[llm]\nmodel = \"m\"").unwrap();
        base.merge(other);
        assert_eq!(base.api_key_for(LlmBackend::OpenAi), Some("a"));
        assert_eq!(base.llm.model.as_deref(), Some("m"));
    }
}
