//! Rule-based classification
//!
//! Deterministic mapping from a [`SignalSet`] to a [`ClassificationCandidate`].
//! Every table entry that fires adds votes to topics and categories. The
//! category with the most votes wins, ties go to the earlier category in the
//! taxonomy, and confidence is derived from how concentrated the votes are.

mod patterns;
mod tables;

pub use patterns::file_pattern_match;
pub use tables::{FileHint, KeywordHint, LanguageHint, TagTables, TopicHint};

use crate::error::{EngineError, EngineResult};
use crate::models::{normalize_topic, topic_root, CandidateSource, Category, ClassificationCandidate};
use crate::signals::SignalSet;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Languages below this share vote for categories but do not become topics
pub const MIN_LANGUAGE_SHARE: f64 = 0.1;

/// Damping constant for the confidence formula. A category needs this many
/// votes before total-vote saturation reaches one half.
const CONFIDENCE_DAMPING: f64 = 2.0;

/// Votes an existing topic casts for itself
const EXISTING_TOPIC_VOTE: f64 = 1.0;

struct CompiledKeyword {
    regex: Regex,
    topics: Vec<String>,
    category: Option<Category>,
    weight: f64,
}

/// Tag tables compiled for repeated classification
pub struct RuleClassifier {
    tables: TagTables,
    keywords: Vec<CompiledKeyword>,
    topic_hints: HashMap<String, Vec<(Category, f64)>>,
}

impl RuleClassifier {
    /// Validate and compile `tables`
    pub fn new(tables: TagTables) -> EngineResult<Self> {
        tables.validate()?;

        let keywords = tables
            .keywords
            .iter()
            .map(|hint| {
                let regex = keyword_regex(&hint.keyword).map_err(|e| {
                    EngineError::InvalidTables(format!("keyword '{}': {}", hint.keyword, e))
                })?;
                Ok(CompiledKeyword {
                    regex,
                    topics: normalized_all(&hint.topics),
                    category: hint.category,
                    weight: hint.weight,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let mut topic_hints: HashMap<String, Vec<(Category, f64)>> = HashMap::new();
        for hint in &tables.topics {
            if let Some(topic) = normalize_topic(&hint.topic) {
                topic_hints.entry(topic).or_default().push((hint.category, hint.weight));
            }
        }

        Ok(Self {
            tables,
            keywords,
            topic_hints,
        })
    }

    /// Classifier over the built-in tables
    pub fn builtin() -> EngineResult<Self> {
        Self::new(TagTables::builtin())
    }

    pub fn tables(&self) -> &TagTables {
        &self.tables
    }

    /// Classify one repository, keeping at most `max_topics` topics
    pub fn classify(&self, signals: &SignalSet, max_topics: usize) -> ClassificationCandidate {
        let mut tally = Tally::default();

        // (0) existing topics
        for topic in &signals.topics {
            tally.vote_topic(topic, EXISTING_TOPIC_VOTE);
            if let Some(hints) = self.topic_hints.get(topic) {
                for (category, weight) in hints {
                    tally.vote_category(*category, *weight);
                }
            }
        }

        // (a) languages, largest share first
        let mut languages: Vec<(&String, f64)> =
            signals.languages.iter().map(|(l, s)| (l, *s)).collect();
        languages.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        for (language, share) in languages {
            if share >= MIN_LANGUAGE_SHARE {
                if let Some(topic) = normalize_topic(language) {
                    tally.vote_topic(&topic, 1.0 + share);
                }
            }
            for hint in self
                .tables
                .languages
                .iter()
                .filter(|h| h.language.eq_ignore_ascii_case(language))
            {
                if share >= MIN_LANGUAGE_SHARE {
                    for topic in normalized_all(&hint.topics) {
                        tally.vote_topic(&topic, hint.weight * share);
                    }
                }
                if let Some(category) = hint.category {
                    tally.vote_category(category, hint.weight * share);
                }
            }
        }

        // (b) filename patterns, one vote per hint regardless of match count
        for hint in &self.tables.files {
            if signals.files.iter().any(|f| file_pattern_match(&hint.pattern, f)) {
                for topic in normalized_all(&hint.topics) {
                    tally.vote_topic(&topic, hint.weight);
                }
                if let Some(category) = hint.category {
                    tally.vote_category(category, hint.weight);
                }
            }
        }

        // (c) keywords in README, description and name
        let haystack = keyword_haystack(signals);
        for keyword in &self.keywords {
            if keyword.regex.is_match(&haystack) {
                for topic in &keyword.topics {
                    tally.vote_topic(topic, keyword.weight);
                }
                if let Some(category) = keyword.category {
                    tally.vote_category(category, keyword.weight);
                }
            }
        }

        let candidate = tally.into_candidate(max_topics);
        debug!(
            "{}: rule classifier chose {} ({:.3}) with {} topics",
            signals.identifier,
            candidate.category,
            candidate.confidence,
            candidate.topics.len()
        );
        candidate
    }
}

/// Classify `signals` with a compiled rule classifier
pub fn classify_rule(
    signals: &SignalSet,
    classifier: &RuleClassifier,
    max_topics: usize,
) -> ClassificationCandidate {
    classifier.classify(signals, max_topics)
}

/// Confidence as a function of vote concentration.
///
/// `top / total` is the winning category's share; `total / (total + 2)`
/// damps confidence when very few votes were cast at all.
pub fn vote_confidence(top: f64, total: f64) -> f64 {
    if !top.is_finite() || !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    let share = top / total;
    let saturation = total / (total + CONFIDENCE_DAMPING);
    (share * saturation).clamp(0.0, 1.0)
}

#[derive(Default)]
struct Tally {
    /// Topic votes in first-seen order
    topics: Vec<(String, f64)>,
    index: HashMap<String, usize>,
    categories: [f64; Category::ALL.len()],
}

impl Tally {
    fn vote_topic(&mut self, topic: &str, votes: f64) {
        match self.index.get(topic) {
            Some(&i) => self.topics[i].1 += votes,
            None => {
                self.index.insert(topic.to_string(), self.topics.len());
                self.topics.push((topic.to_string(), votes));
            }
        }
    }

    fn vote_category(&mut self, category: Category, votes: f64) {
        self.categories[category.precedence()] += votes;
    }

    fn into_candidate(self, max_topics: usize) -> ClassificationCandidate {
        let total: f64 = self.categories.iter().sum();

        // Strict > keeps the earlier category on ties
        let mut best: Option<(Category, f64)> = None;
        for category in Category::ALL {
            let votes = self.categories[category.precedence()];
            if votes > 0.0 && best.map_or(true, |(_, b)| votes > b) {
                best = Some((category, votes));
            }
        }
        let (category, confidence) = match best {
            Some((category, top)) => (category, vote_confidence(top, total)),
            None => (Category::Other, 0.0),
        };

        // Stable sort: equal votes stay in first-seen order
        let mut ranked = self.topics;
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let topics = dedupe_and_cap(ranked.into_iter().map(|(t, _)| t), max_topics);

        ClassificationCandidate {
            category,
            topics,
            confidence,
            source: CandidateSource::Rule,
            rationale: None,
        }
    }
}

/// Keep the first topic per root, then cap
pub(crate) fn dedupe_and_cap(topics: impl IntoIterator<Item = String>, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    topics
        .into_iter()
        .filter(|t| seen.insert(topic_root(t)))
        .take(max)
        .collect()
}

fn normalized_all(topics: &[String]) -> Vec<String> {
    topics.iter().filter_map(|t| normalize_topic(t)).collect()
}

/// Case-insensitive whole-word regex for a keyword or phrase
fn keyword_regex(keyword: &str) -> Result<Regex, regex::Error> {
    let keyword = keyword.trim();
    let escaped = regex::escape(keyword);
    let starts_word = keyword.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
    let ends_word = keyword.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_');
    let pattern = format!(
        "(?i){}{}{}",
        if starts_word { r"\b" } else { "" },
        escaped,
        if ends_word { r"\b" } else { "" }
    );
    Regex::new(&pattern)
}

fn keyword_haystack(signals: &SignalSet) -> String {
    let name = signals.name.replace(['-', '_'], " ");
    let description = signals.description.as_deref().unwrap_or("");
    format!("{}\n{}\n{}", signals.readme, description, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{extract, RawSnapshot};

    fn signals(json: &str) -> SignalSet {
        let raw: RawSnapshot = serde_json::from_str(json).unwrap();
        extract(&raw).unwrap()
    }

    fn classifier() -> RuleClassifier {
        RuleClassifier::builtin().unwrap()
    }

    #[test]
    fn test_flask_rest_api_is_web() {
        let s = signals(r#"{"full_name": "a/b", "languages": {"Python": 100}, "readme": "A Flask REST API"}"#);
        let candidate = classifier().classify(&s, 10);
        assert_eq!(candidate.category, Category::Web);
        assert_eq!(candidate.source, CandidateSource::Rule);
        assert!(candidate.topics.contains(&"python".to_string()));
        assert!(candidate.topics.contains(&"flask".to_string()));
        assert!(candidate.confidence > 0.0 && candidate.confidence <= 1.0);
    }

    #[test]
    fn test_empty_signals_yield_other() {
        let s = signals(r#"{"full_name": "a/b"}"#);
        let candidate = classifier().classify(&s, 10);
        assert_eq!(candidate.category, Category::Other);
        assert!(candidate.topics.is_empty());
        assert_eq!(candidate.confidence, 0.0);
    }

    #[test]
    fn test_tie_broken_by_precedence() {
        let tables = TagTables {
            keywords: vec![
                KeywordHint {
                    keyword: "alpha".into(),
                    topics: vec![],
                    category: Some(Category::Library),
                    weight: 1.0,
                },
                KeywordHint {
                    keyword: "beta".into(),
                    topics: vec![],
                    category: Some(Category::Cli),
                    weight: 1.0,
                },
            ],
            ..Default::default()
        };
        let classifier = RuleClassifier::new(tables).unwrap();
        let s = signals(r#"{"full_name": "a/b", "readme": "alpha beta"}"#);
        assert_eq!(classifier.classify(&s, 10).category, Category::Cli);
    }

    #[test]
    fn test_deterministic() {
        let s = signals(
            r#"{"full_name": "a/ml-toolkit", "languages": {"Python": 60, "Jupyter Notebook": 40},
                "files": ["setup.py", "notebooks"], "topics": ["pandas"],
                "readme": "Machine learning library with a CLI"}"#,
        );
        let c = classifier();
        let first = c.classify(&s, 10);
        for _ in 0..5 {
            assert_eq!(c.classify(&s, 10), first);
        }
    }

    #[test]
    fn test_topics_capped_and_deduped_by_root() {
        let s = signals(
            r#"{"full_name": "a/b", "topics": ["machine-learning", "machinelearning", "a", "b", "c", "d"],
                "readme": "machine learning"}"#,
        );
        let candidate = classifier().classify(&s, 3);
        assert_eq!(candidate.topics.len(), 3);
        let roots: HashSet<String> = candidate.topics.iter().map(|t| topic_root(t)).collect();
        assert_eq!(roots.len(), candidate.topics.len());
        assert_eq!(candidate.topics[0], "machine-learning");
    }

    #[test]
    fn test_file_hints_vote() {
        let s = signals(r#"{"full_name": "a/infra", "files": ["main.tf", "variables.tf", "README.md"]}"#);
        let candidate = classifier().classify(&s, 10);
        assert_eq!(candidate.category, Category::Infrastructure);
        assert_eq!(candidate.topics, vec!["terraform".to_string()]);
    }

    #[test]
    fn test_keyword_requires_whole_word() {
        let s = signals(r#"{"full_name": "a/b", "readme": "reactivity and apiary"}"#);
        let candidate = classifier().classify(&s, 10);
        assert!(!candidate.topics.contains(&"react".to_string()));
        assert!(!candidate.topics.contains(&"api".to_string()));
    }

    #[test]
    fn test_name_words_are_keywords() {
        let s = signals(r#"{"full_name": "a/django_blog"}"#);
        let candidate = classifier().classify(&s, 10);
        assert_eq!(candidate.category, Category::Web);
        assert_eq!(candidate.topics, vec!["django".to_string()]);
    }

    #[test]
    fn test_vote_confidence_monotonic() {
        assert_eq!(vote_confidence(0.0, 0.0), 0.0);
        assert!(vote_confidence(2.0, 2.0) < vote_confidence(6.0, 6.0));
        assert!(vote_confidence(3.0, 6.0) < vote_confidence(6.0, 6.0));
        assert!(vote_confidence(1e9, 1e9) <= 1.0);
    }

    #[test]
    fn test_symbol_keywords_compile() {
        assert!(keyword_regex("c++").unwrap().is_match("Written in C++ today"));
        assert!(keyword_regex("ci/cd").unwrap().is_match("a CI/CD pipeline"));
    }
}
