//! Project-level configuration support
//!
//! Loads engine configuration from `repolens.toml` or `.repolensrc.json` in a
//! directory, or from an explicit file.
//!
//! # Configuration Format
//!
//! ```toml
//! # repolens.toml
//! max_topics = 8
//! readme_limit = 5000
//! preferred_only = false
//!
//! [preferred_tags]
//! machine-learning = "Models, training and inference"
//!
//! [[tables.keywords]]
//! keyword = "streamlit"
//! topics = ["streamlit", "dashboard"]
//! category = "Data/ML"
//!
//! [[rule_sets.team]]
//! id = "missing_codeowners"
//! check = "has_file"
//! names = ["CODEOWNERS", ".github/"]
//!
//! [[grades]]
//! grade = "pass"
//! min_score = 60
//!
//! [[grades]]
//! grade = "fail"
//! min_score = 0
//!
//! [themes]
//! research = ["Library", "Data/ML", "Web"]
//!
//! [llm]
//! enabled = true
//! backend = "ollama"
//! timeout_secs = 20
//!
//! [defaults]
//! rule_set = "professional"
//! theme = "resume"
//! ```

use crate::ai::{AiConfig, LlmBackend};
use crate::classifier::TagTables;
use crate::error::{EngineError, EngineResult};
use crate::grouping::ThemeOrders;
use crate::health::{GradeThresholds, HealthRule, RuleSetRegistry, RuleSpec};
use crate::models::{Category, DEFAULT_MAX_TOPICS};
use crate::preferred::PreferredTags;
use crate::signals::DEFAULT_README_LIMIT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_FILE_TOML: &str = "repolens.toml";
pub const CONFIG_FILE_JSON: &str = ".repolensrc.json";

/// Engine configuration as written in a project config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,

    /// README characters kept by signal extraction
    #[serde(default = "default_readme_limit")]
    pub readme_limit: usize,

    /// Preferred tag vocabulary, tag -> description
    #[serde(default)]
    pub preferred_tags: PreferredTags,

    /// Drop final topics that no preferred tag covers
    #[serde(default)]
    pub preferred_only: bool,

    /// Extra hints, appended after the built-in tables
    #[serde(default)]
    pub tables: TagTables,

    /// Rule sets to add, or to replace built-ins of the same name
    #[serde(default)]
    pub rule_sets: BTreeMap<String, Vec<RuleSpec>>,

    /// Score-to-grade thresholds; A-F when absent
    #[serde(default)]
    pub grades: Option<GradeThresholds>,

    /// Theme display orders, theme -> categories
    #[serde(default)]
    pub themes: BTreeMap<String, Vec<Category>>,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub defaults: CliDefaults,
}

fn default_max_topics() -> usize {
    DEFAULT_MAX_TOPICS
}

fn default_readme_limit() -> usize {
    DEFAULT_README_LIMIT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_topics: default_max_topics(),
            readme_limit: default_readme_limit(),
            preferred_tags: PreferredTags::default(),
            preferred_only: false,
            tables: TagTables::default(),
            rule_sets: BTreeMap::new(),
            grades: None,
            themes: BTreeMap::new(),
            llm: LlmSettings::default(),
            defaults: CliDefaults::default(),
        }
    }
}

impl EngineConfig {
    /// Reject values no component can work with
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_topics == 0 {
            return Err(EngineError::Config("max_topics must be at least 1".to_string()));
        }
        if self.readme_limit == 0 {
            return Err(EngineError::Config("readme_limit must be at least 1".to_string()));
        }
        if self.llm.max_concurrency == 0 {
            return Err(EngineError::Config(
                "llm.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config("llm.timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Built-in hint tables followed by the configured extras
    pub fn tag_tables(&self) -> EngineResult<TagTables> {
        let mut tables = TagTables::builtin();
        tables.extend(self.tables.clone());
        tables.validate()?;
        Ok(tables)
    }

    /// Built-in rule sets overlaid with the configured ones
    pub fn rule_registry(&self) -> EngineResult<RuleSetRegistry> {
        let mut registry = RuleSetRegistry::builtin();
        for (name, specs) in &self.rule_sets {
            if registry.contains(name) {
                debug!("Replacing built-in rule set '{}'", name);
            }
            let rules: Vec<HealthRule> = specs.iter().cloned().map(HealthRule::from).collect();
            registry.register(name.as_str(), rules)?;
        }
        Ok(registry)
    }

    pub fn grade_thresholds(&self) -> GradeThresholds {
        self.grades.clone().unwrap_or_default()
    }

    /// Built-in themes overlaid with the configured ones
    pub fn theme_orders(&self) -> EngineResult<ThemeOrders> {
        let mut themes = ThemeOrders::builtin();
        for (name, categories) in &self.themes {
            themes.insert(name, categories)?;
        }
        Ok(themes)
    }
}

/// `[llm]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// LLM classification is opt-in
    #[serde(default)]
    pub enabled: bool,

    /// Backend; falls back to the user config, then Anthropic
    #[serde(default)]
    pub backend: Option<LlmBackend>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_url: Option<String>,

    /// Caller-side timeout around one classification call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on in-flight gateway calls
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: None,
            model: None,
            api_url: None,
            timeout_secs: default_timeout_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Client settings for `backend`, keeping the HTTP timeout inside ours
    pub fn ai_config(&self, backend: LlmBackend) -> AiConfig {
        AiConfig {
            backend,
            model: self.model.clone(),
            api_url: self.api_url.clone(),
            timeout: self.timeout(),
            ..AiConfig::default()
        }
    }
}

/// `[defaults]` section: CLI flag defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliDefaults {
    pub rule_set: Option<String>,
    pub theme: Option<String>,
    pub min_score: Option<f64>,
    pub workers: Option<usize>,
    pub format: Option<String>,
}

/// Load configuration for a directory
///
/// Tries `repolens.toml` first, then `.repolensrc.json`. Returns defaults
/// when neither exists; a file that exists but cannot be parsed is an error.
pub fn load_config(dir: &Path) -> EngineResult<EngineConfig> {
    for name in [CONFIG_FILE_TOML, CONFIG_FILE_JSON] {
        let path = dir.join(name);
        if path.exists() {
            return load_config_file(&path);
        }
    }

    debug!("No project config found, using defaults");
    Ok(EngineConfig::default())
}

/// Load an explicit config file, TOML or JSON by extension
pub fn load_config_file(path: &Path) -> EngineResult<EngineConfig> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let loaded = if is_json {
        load_json_config(path)
    } else {
        load_toml_config(path)
    };

    match loaded {
        Ok(config) => {
            debug!("Loaded project config from {}", path.display());
            Ok(config)
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            Err(EngineError::Config(format!("{}: {}", path.display(), e)))
        }
    }
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Written by `repolens init`
pub const EXAMPLE_CONFIG: &str = r#"# repolens project configuration

# Most topics kept per repository
max_topics = 10

# README characters used for classification
readme_limit = 5000

# Keep only topics covered by [preferred_tags]
preferred_only = false

[preferred_tags]
# machine-learning = "Models, training and inference"
# web-development = "Websites, web servers and REST APIs"

# Extra classifier hints, checked after the built-in tables
# [[tables.keywords]]
# keyword = "streamlit"
# topics = ["streamlit", "dashboard"]
# category = "Data/ML"

# Custom rule sets; a name matching a built-in replaces it
# [[rule_sets.team]]
# id = "missing_codeowners"
# description = "Ownership is declared"
# category = "community"
# check = "has_file"
# names = ["CODEOWNERS", ".github/"]

# Grade thresholds, best first, the last at 0
# [[grades]]
# grade = "pass"
# min_score = 60
#
# [[grades]]
# grade = "fail"
# min_score = 0

[themes]
# research = ["Library", "Data/ML", "Web"]

[llm]
enabled = false
# backend = "anthropic"   # anthropic, openai, openrouter, ollama
# model = "claude-sonnet-4-20250514"
timeout_secs = 30
max_concurrency = 4

[defaults]
# rule_set = "general"
# theme = "portfolio"
# min_score = 70
# workers = 8
"#;
