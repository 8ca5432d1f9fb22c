//! Core data models for repolens
//!
//! These models are shared by the classifiers, the merger, the preferred-tag
//! resolver and the grouping step. Everything here is plain data that
//! serializes to JSON without leaking engine internals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum topic length accepted by code-hosting platforms
pub const MAX_TOPIC_LEN: usize = 50;

/// Default cap on the number of topics per repository
pub const DEFAULT_MAX_TOPICS: usize = 10;

/// Fixed category taxonomy.
///
/// Declaration order is the table precedence order used to break ties
/// between equally voted categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Web,
    Desktop,
    Cli,
    Library,
    DataMl,
    Infrastructure,
    LearningResource,
    Documentation,
    Other,
}

impl Category {
    /// All categories in precedence order
    pub const ALL: [Category; 9] = [
        Category::Web,
        Category::Desktop,
        Category::Cli,
        Category::Library,
        Category::DataMl,
        Category::Infrastructure,
        Category::LearningResource,
        Category::Documentation,
        Category::Other,
    ];

    /// Display label, also the serialized form
    pub fn label(&self) -> &'static str {
        match self {
            Category::Web => "Web",
            Category::Desktop => "Desktop",
            Category::Cli => "CLI/Tool",
            Category::Library => "Library",
            Category::DataMl => "Data/ML",
            Category::Infrastructure => "Infrastructure",
            Category::LearningResource => "Learning Resource",
            Category::Documentation => "Documentation",
            Category::Other => "Other",
        }
    }

    /// Noun used when composing a one-line description
    pub fn noun(&self) -> &'static str {
        match self {
            Category::Web => "web application",
            Category::Desktop => "desktop application",
            Category::Cli => "command-line tool",
            Category::Library => "library",
            Category::DataMl => "data analysis project",
            Category::Infrastructure => "infrastructure project",
            Category::LearningResource => "learning resource",
            Category::Documentation => "documentation project",
            Category::Other => "project",
        }
    }

    /// Position in the precedence order
    pub fn precedence(&self) -> usize {
        *self as usize
    }

    /// Parse a category name, accepting close variants case-insensitively.
    ///
    /// "Web Application", "webapp", "cli tool", "Machine Learning", "docs"
    /// and the display labels all map onto the taxonomy. Returns `None` for
    /// anything that is not recognisably a category.
    pub fn parse_loose(name: &str) -> Option<Category> {
        let key: String = name
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        let category = match key.as_str() {
            "web" | "webapp" | "webapps" | "webapplication" | "webapplications" | "website"
            | "api" | "apis" | "webservice" | "backend" | "frontend" => Category::Web,
            "desktop" | "desktopapp" | "desktopapplication" | "desktopapplications" | "gui"
            | "guiapplication" => Category::Desktop,
            "cli" | "clitool" | "clitools" | "tool" | "tools" | "commandline"
            | "commandlinetool" | "utility" | "utilities" => Category::Cli,
            "library" | "libraries" | "lib" | "package" | "packages" | "framework" | "sdk"
            | "pythonpackage" | "module" => Category::Library,
            "dataml" | "data" | "ml" | "ai" | "datascience" | "machinelearning" | "analysis"
            | "dataanalysis" | "mlai" | "aiml" => Category::DataMl,
            "infrastructure" | "infra" | "devops" | "deployment" | "cloud" => {
                Category::Infrastructure
            }
            "learningresource" | "learningresources" | "learning" | "tutorial" | "tutorials"
            | "education" | "educational" | "course" | "coursework" => Category::LearningResource,
            "documentation" | "docs" | "doc" => Category::Documentation,
            "other" | "misc" | "miscellaneous" => Category::Other,
            _ => return None,
        };
        Some(category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Category::parse_loose(&value).ok_or_else(|| format!("unknown category '{}'", value))
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

/// Which classifier produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Rule,
    Llm,
}

/// A proposed classification from one source, before merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationCandidate {
    pub category: Category,
    /// Normalized topics, most relevant first, no duplicate roots
    pub topics: Vec<String>,
    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
    pub source: CandidateSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl ClassificationCandidate {
    /// The fallback for repositories with no usable signal
    pub fn empty(source: CandidateSource) -> Self {
        Self {
            category: Category::Other,
            topics: Vec::new(),
            confidence: 0.0,
            source,
            rationale: None,
        }
    }
}

/// Where a final topic came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    FromRule,
    FromLlm,
    FromPreferred,
}

/// A topic with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTopic {
    pub topic: String,
    pub provenance: Provenance,
}

impl ClassifiedTopic {
    pub fn new(topic: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            topic: topic.into(),
            provenance,
        }
    }
}

/// Final category and topic decision for one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedClassification {
    pub category: Category,
    /// Which candidate supplied the category
    pub category_source: CandidateSource,
    /// Priority order, most relevant first
    pub topics: Vec<ClassifiedTopic>,
    pub confidence: f64,
    /// Whether an LLM candidate took part in the merge
    pub llm_used: bool,
}

impl MergedClassification {
    /// Topic names in priority order
    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.topic.as_str()).collect()
    }
}

/// Normalize a raw topic into platform topic form.
///
/// Lowercase, symbol-bearing language names spelled out (`c++` → `cpp`),
/// runs of other characters collapsed to a single hyphen, trimmed, capped at
/// 50 characters. Returns `None` when nothing usable remains.
pub fn normalize_topic(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    let spelled = match lower.as_str() {
        "c++" => "cpp".to_string(),
        "c#" => "csharp".to_string(),
        "f#" => "fsharp".to_string(),
        "objective-c++" => "objective-cpp".to_string(),
        _ => lower.replace("c++", "cpp").replace("c#", "csharp"),
    };

    let mut out = String::with_capacity(spelled.len());
    let mut pending_hyphen = false;
    for c in spelled.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if out.is_empty() {
        return None;
    }

    if out.len() > MAX_TOPIC_LEN {
        let cut = &out[..MAX_TOPIC_LEN];
        let cut = match cut.rfind('-') {
            Some(idx) if idx > 0 => &cut[..idx],
            _ => cut,
        };
        out = cut.trim_end_matches('-').to_string();
    }

    Some(out)
}

/// Deduplication key for a normalized topic: hyphens removed
pub fn topic_root(topic: &str) -> String {
    topic.chars().filter(|c| *c != '-').collect()
}
