//! Tag tables for the rule-based classifier
//!
//! Four ordered tables feed the vote tally:
//! - language hints, scaled by the language's byte share
//! - filename pattern hints (manifests, config files, notebook extensions)
//! - README/description/name keyword hints
//! - topic hints, mapping an existing topic onto a category
//!
//! Built-in tables are plain data. Configuration may append entries; user
//! entries are evaluated after the built-ins and never replace them.

use crate::error::{EngineError, EngineResult};
use crate::models::Category;
use serde::{Deserialize, Serialize};

fn default_weight() -> f64 {
    1.0
}

/// Language name → extra topics and category vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageHint {
    pub language: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Top-level filename pattern → framework topics and category vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHint {
    /// Exact name, `*` wildcard, or a directory name with a trailing `/`
    pub pattern: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Word or phrase occurrence → topics and category vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHint {
    pub keyword: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Existing topic → category vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicHint {
    pub topic: String,
    pub category: Category,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// The complete, ordered hint tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagTables {
    #[serde(default)]
    pub languages: Vec<LanguageHint>,
    #[serde(default)]
    pub files: Vec<FileHint>,
    #[serde(default)]
    pub keywords: Vec<KeywordHint>,
    #[serde(default)]
    pub topics: Vec<TopicHint>,
}

use Category::*;

type Hint = (&'static str, &'static [&'static str], Option<Category>, f64);

const LANGUAGE_HINTS: &[Hint] = &[
    ("HTML", &[], Some(Web), 1.0),
    ("CSS", &[], Some(Web), 1.0),
    ("SCSS", &["sass"], Some(Web), 1.0),
    ("JavaScript", &[], Some(Web), 0.5),
    ("TypeScript", &[], Some(Web), 0.5),
    ("Vue", &["vue"], Some(Web), 1.5),
    ("Svelte", &["svelte"], Some(Web), 1.5),
    ("PHP", &[], Some(Web), 1.0),
    ("Jupyter Notebook", &["jupyter"], Some(DataMl), 1.5),
    ("R", &[], Some(DataMl), 1.0),
    ("Julia", &[], Some(DataMl), 0.5),
    ("MATLAB", &[], Some(DataMl), 0.5),
    ("HCL", &["terraform"], Some(Infrastructure), 1.5),
    ("Dockerfile", &["docker"], Some(Infrastructure), 0.5),
    ("Nix", &[], Some(Infrastructure), 1.0),
    ("Shell", &[], Some(Cli), 0.3),
    ("PowerShell", &[], Some(Cli), 0.3),
    ("QML", &["qt"], Some(Desktop), 1.0),
    ("C#", &["dotnet"], Some(Desktop), 0.3),
    ("Swift", &[], Some(Desktop), 0.3),
    ("Objective-C", &[], Some(Desktop), 0.3),
    ("TeX", &["latex"], Some(Documentation), 1.0),
];

const FILE_HINTS: &[Hint] = &[
    ("package.json", &["nodejs"], None, 0.5),
    ("requirements.txt", &["python"], None, 0.5),
    ("pyproject.toml", &["python"], Some(Library), 0.5),
    ("setup.py", &["python"], Some(Library), 1.0),
    ("setup.cfg", &["python"], Some(Library), 0.5),
    ("Cargo.toml", &["rust"], None, 0.5),
    ("go.mod", &["go"], None, 0.5),
    ("pom.xml", &["java", "maven"], None, 0.5),
    ("build.gradle", &["java", "gradle"], None, 0.5),
    ("Gemfile", &["ruby"], None, 0.5),
    ("CMakeLists.txt", &["cmake"], None, 0.5),
    ("*.sln", &["dotnet"], None, 0.5),
    ("*.csproj", &["dotnet"], None, 0.5),
    ("manage.py", &["django"], Some(Web), 2.0),
    ("app.py", &[], Some(Web), 0.5),
    ("wsgi.py", &[], Some(Web), 1.0),
    ("index.html", &[], Some(Web), 1.0),
    ("next.config.*", &["nextjs", "react"], Some(Web), 2.0),
    ("nuxt.config.*", &["nuxt", "vue"], Some(Web), 2.0),
    ("vite.config.*", &["vite"], Some(Web), 1.0),
    ("angular.json", &["angular"], Some(Web), 2.0),
    ("svelte.config.js", &["svelte"], Some(Web), 2.0),
    ("_config.yml", &["jekyll"], Some(Web), 0.5),
    ("tauri.conf.json", &["tauri"], Some(Desktop), 2.0),
    ("src-tauri/", &["tauri"], Some(Desktop), 2.0),
    ("electron-builder.*", &["electron"], Some(Desktop), 2.0),
    ("forge.config.js", &["electron"], Some(Desktop), 1.5),
    ("pubspec.yaml", &["flutter", "dart"], Some(Desktop), 0.5),
    ("*.xcodeproj", &["xcode"], Some(Desktop), 0.5),
    ("cli.py", &[], Some(Cli), 1.5),
    ("__main__.py", &[], Some(Cli), 1.5),
    ("bin/", &[], Some(Cli), 0.5),
    ("cmd/", &[], Some(Cli), 0.5),
    ("lib/", &[], Some(Library), 0.5),
    ("*.ipynb", &["jupyter"], Some(DataMl), 1.5),
    ("notebooks/", &["jupyter"], Some(DataMl), 1.0),
    ("environment.yml", &["conda"], Some(DataMl), 0.5),
    ("dvc.yaml", &["dvc", "mlops"], Some(DataMl), 1.5),
    ("Dockerfile", &["docker"], Some(Infrastructure), 0.5),
    ("docker-compose*.yml", &["docker"], Some(Infrastructure), 0.5),
    ("compose.yaml", &["docker"], Some(Infrastructure), 0.5),
    ("*.tf", &["terraform"], Some(Infrastructure), 2.0),
    ("Chart.yaml", &["helm", "kubernetes"], Some(Infrastructure), 2.0),
    ("ansible.cfg", &["ansible"], Some(Infrastructure), 1.5),
    ("playbook.yml", &["ansible"], Some(Infrastructure), 1.5),
    ("exercises/", &[], Some(LearningResource), 1.0),
    ("lessons/", &[], Some(LearningResource), 1.0),
    ("solutions/", &[], Some(LearningResource), 1.0),
    ("mkdocs.yml", &["mkdocs"], Some(Documentation), 1.5),
    ("book.toml", &["mdbook"], Some(Documentation), 1.5),
    ("conf.py", &["sphinx"], Some(Documentation), 1.0),
];

const KEYWORD_HINTS: &[Hint] = &[
    ("flask", &["flask"], Some(Web), 1.0),
    ("django", &["django"], Some(Web), 1.0),
    ("fastapi", &["fastapi"], Some(Web), 1.0),
    ("express.js", &["express"], Some(Web), 1.0),
    ("react", &["react"], Some(Web), 1.0),
    ("vue", &["vue"], Some(Web), 1.0),
    ("angular", &["angular"], Some(Web), 1.0),
    ("svelte", &["svelte"], Some(Web), 1.0),
    ("next.js", &["nextjs"], Some(Web), 1.0),
    ("rest api", &["rest-api"], Some(Web), 1.0),
    ("restful", &["rest-api"], Some(Web), 1.0),
    ("graphql", &["graphql"], Some(Web), 1.0),
    ("api", &["api"], Some(Web), 0.5),
    ("website", &[], Some(Web), 1.0),
    ("web app", &[], Some(Web), 1.0),
    ("web application", &[], Some(Web), 1.0),
    ("desktop app", &["desktop-app"], Some(Desktop), 1.5),
    ("desktop application", &["desktop-app"], Some(Desktop), 1.5),
    ("gui", &["gui"], Some(Desktop), 1.0),
    ("electron", &["electron"], Some(Desktop), 1.0),
    ("tauri", &["tauri"], Some(Desktop), 1.0),
    ("tkinter", &["tkinter"], Some(Desktop), 1.0),
    ("pyqt", &["pyqt"], Some(Desktop), 1.0),
    ("command line", &["cli"], Some(Cli), 1.0),
    ("command-line", &["cli"], Some(Cli), 1.0),
    ("cli", &["cli"], Some(Cli), 1.0),
    ("terminal", &[], Some(Cli), 0.5),
    ("library", &["library"], Some(Library), 1.0),
    ("sdk", &["sdk"], Some(Library), 1.0),
    ("framework", &[], Some(Library), 0.5),
    ("package", &[], Some(Library), 0.3),
    ("machine learning", &["machine-learning"], Some(DataMl), 1.5),
    ("deep learning", &["deep-learning"], Some(DataMl), 1.5),
    ("neural network", &["neural-networks"], Some(DataMl), 1.0),
    ("data science", &["data-science"], Some(DataMl), 1.0),
    ("data analysis", &["data-analysis"], Some(DataMl), 1.0),
    ("natural language processing", &["nlp"], Some(DataMl), 1.0),
    ("nlp", &["nlp"], Some(DataMl), 1.0),
    ("pytorch", &["pytorch"], Some(DataMl), 1.0),
    ("tensorflow", &["tensorflow"], Some(DataMl), 1.0),
    ("scikit-learn", &["scikit-learn"], Some(DataMl), 1.0),
    ("pandas", &["pandas"], Some(DataMl), 1.0),
    ("numpy", &["numpy"], Some(DataMl), 0.5),
    ("docker", &["docker"], Some(Infrastructure), 0.5),
    ("kubernetes", &["kubernetes"], Some(Infrastructure), 1.0),
    ("terraform", &["terraform"], Some(Infrastructure), 1.0),
    ("ansible", &["ansible"], Some(Infrastructure), 1.0),
    ("devops", &["devops"], Some(Infrastructure), 1.0),
    ("ci/cd", &["ci-cd"], Some(Infrastructure), 0.5),
    ("tutorial", &["tutorial"], Some(LearningResource), 1.5),
    ("course", &["course"], Some(LearningResource), 1.0),
    ("lecture", &["education"], Some(LearningResource), 1.0),
    ("homework", &["education"], Some(LearningResource), 1.0),
    ("assignment", &["education"], Some(LearningResource), 0.5),
    ("exercises", &[], Some(LearningResource), 0.5),
    ("documentation", &[], Some(Documentation), 0.5),
    ("handbook", &["documentation"], Some(Documentation), 1.0),
];

const TOPIC_HINTS: &[(&str, Category)] = &[
    ("web", Web),
    ("web-app", Web),
    ("webapp", Web),
    ("website", Web),
    ("api", Web),
    ("rest-api", Web),
    ("frontend", Web),
    ("backend", Web),
    ("flask", Web),
    ("django", Web),
    ("react", Web),
    ("desktop", Desktop),
    ("desktop-app", Desktop),
    ("gui", Desktop),
    ("electron", Desktop),
    ("tauri", Desktop),
    ("cli", Cli),
    ("command-line", Cli),
    ("cli-tool", Cli),
    ("terminal", Cli),
    ("library", Library),
    ("lib", Library),
    ("package", Library),
    ("sdk", Library),
    ("machine-learning", DataMl),
    ("deep-learning", DataMl),
    ("data-science", DataMl),
    ("data-analysis", DataMl),
    ("jupyter", DataMl),
    ("jupyter-notebook", DataMl),
    ("ml", DataMl),
    ("ai", DataMl),
    ("devops", Infrastructure),
    ("docker", Infrastructure),
    ("kubernetes", Infrastructure),
    ("terraform", Infrastructure),
    ("infrastructure", Infrastructure),
    ("tutorial", LearningResource),
    ("education", LearningResource),
    ("course", LearningResource),
    ("learning", LearningResource),
    ("teaching", LearningResource),
    ("documentation", Documentation),
    ("docs", Documentation),
];

fn topics_of(topics: &[&str]) -> Vec<String> {
    topics.iter().map(|t| t.to_string()).collect()
}

impl TagTables {
    /// Built-in hint tables
    pub fn builtin() -> Self {
        Self {
            languages: LANGUAGE_HINTS
                .iter()
                .map(|(language, topics, category, weight)| LanguageHint {
                    language: language.to_string(),
                    topics: topics_of(topics),
                    category: *category,
                    weight: *weight,
                })
                .collect(),
            files: FILE_HINTS
                .iter()
                .map(|(pattern, topics, category, weight)| FileHint {
                    pattern: pattern.to_string(),
                    topics: topics_of(topics),
                    category: *category,
                    weight: *weight,
                })
                .collect(),
            keywords: KEYWORD_HINTS
                .iter()
                .map(|(keyword, topics, category, weight)| KeywordHint {
                    keyword: keyword.to_string(),
                    topics: topics_of(topics),
                    category: *category,
                    weight: *weight,
                })
                .collect(),
            topics: TOPIC_HINTS
                .iter()
                .map(|(topic, category)| TopicHint {
                    topic: topic.to_string(),
                    category: *category,
                    weight: 1.0,
                })
                .collect(),
        }
    }

    /// Append another table set after this one
    pub fn extend(&mut self, extra: TagTables) {
        self.languages.extend(extra.languages);
        self.files.extend(extra.files);
        self.keywords.extend(extra.keywords);
        self.topics.extend(extra.topics);
    }

    /// Reject empty keys and non-positive or non-finite weights
    pub fn validate(&self) -> EngineResult<()> {
        let entries = self
            .languages
            .iter()
            .map(|h| ("language", h.language.as_str(), h.weight))
            .chain(self.files.iter().map(|h| ("file", h.pattern.as_str(), h.weight)))
            .chain(self.keywords.iter().map(|h| ("keyword", h.keyword.as_str(), h.weight)))
            .chain(self.topics.iter().map(|h| ("topic", h.topic.as_str(), h.weight)));

        for (kind, key, weight) in entries {
            if key.trim().is_empty() {
                return Err(EngineError::InvalidTables(format!("empty {} hint key", kind)));
            }
            if !weight.is_finite() || weight <= 0.0 {
                return Err(EngineError::InvalidTables(format!(
                    "{} hint '{}' has invalid weight {}",
                    kind, key, weight
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_topic;

    #[test]
    fn test_builtin_tables_are_valid() {
        TagTables::builtin().validate().unwrap();
    }

    #[test]
    fn test_builtin_topics_are_normalized() {
        let tables = TagTables::builtin();
        let all_topics = tables
            .languages
            .iter()
            .flat_map(|h| h.topics.iter())
            .chain(tables.files.iter().flat_map(|h| h.topics.iter()))
            .chain(tables.keywords.iter().flat_map(|h| h.topics.iter()))
            .chain(tables.topics.iter().map(|h| &h.topic));
        for topic in all_topics {
            assert_eq!(normalize_topic(topic).as_deref(), Some(topic.as_str()));
        }
    }

    #[test]
    fn test_extend_appends_after_builtins() {
        let mut tables = TagTables::builtin();
        let builtin_len = tables.keywords.len();
        let extra: TagTables = toml::from_str(
            r#"
            [[keywords]]
            keyword = "bevy"
            topics = ["bevy", "gamedev"]
            category = "Desktop"
            "#,
        )
        .unwrap();
        tables.extend(extra);
        assert_eq!(tables.keywords.len(), builtin_len + 1);
        let last = tables.keywords.last().unwrap();
        assert_eq!(last.keyword, "bevy");
        assert_eq!(last.category, Some(Category::Desktop));
        assert_eq!(last.weight, 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_weight() {
        let tables = TagTables {
            keywords: vec![KeywordHint {
                keyword: "x".into(),
                topics: vec![],
                category: None,
                weight: 0.0,
            }],
            ..Default::default()
        };
        assert!(matches!(tables.validate(), Err(EngineError::InvalidTables(_))));
    }
}
