//! Rule-based description proposals for repositories without one

use crate::models::{Category, MergedClassification};
use crate::signals::{truncate_at_word, SignalSet};

/// Longest description accepted by the hosting platform's one-line field
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Propose a one-line description, or `None` when the repository has one.
///
/// Built from the primary language, the category and the top three topics,
/// degrading to the repository name when signals are thin.
pub fn propose_description(signals: &SignalSet, merged: &MergedClassification) -> Option<String> {
    if signals.description.is_some() {
        return None;
    }

    let language = signals.primary_language();
    let topics: Vec<&str> = merged.topics.iter().take(3).map(|t| t.topic.as_str()).collect();
    let name = signals.name.replace(['-', '_'], " ");
    let noun = match merged.category {
        Category::Other => "project",
        other => other.noun(),
    };

    let text = match (language, topics.is_empty()) {
        (Some(lang), false) => format!("{} {} for {}", lang, noun, topics.join(", ")),
        (Some(lang), true) => format!("{} project: {}", lang, name),
        (None, false) => format!("Project for {}", topics.join(", ")),
        (None, true) => format!("Project: {}", name),
    };

    Some(cap(&text))
}

fn cap(text: &str) -> String {
    match truncate_at_word(text, MAX_DESCRIPTION_LEN) {
        "" => text.chars().take(MAX_DESCRIPTION_LEN).collect(),
        cut => cut.trim_end_matches([',', ':']).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSource, ClassifiedTopic, Provenance};
    use crate::signals::{extract, RawSnapshot};

    fn signals(json: &str) -> SignalSet {
        let raw: RawSnapshot = serde_json::from_str(json).unwrap();
        extract(&raw).unwrap()
    }

    fn merged(category: Category, topics: &[&str]) -> MergedClassification {
        MergedClassification {
            category,
            category_source: CandidateSource::Rule,
            topics: topics
                .iter()
                .map(|t| ClassifiedTopic::new(*t, Provenance::FromRule))
                .collect(),
            confidence: 0.5,
            llm_used: false,
        }
    }

    #[test]
    fn test_existing_description_kept() {
        let s = signals(r#"{"full_name": "a/b", "description": "Already here"}"#);
        assert_eq!(propose_description(&s, &merged(Category::Web, &["x"])), None);
    }

    #[test]
    fn test_language_category_topics() {
        let s = signals(r#"{"full_name": "a/todo-api", "language": "Python"}"#);
        let m = merged(Category::Web, &["flask", "rest-api", "sqlite", "docker"]);
        assert_eq!(
            propose_description(&s, &m).as_deref(),
            Some("Python web application for flask, rest-api, sqlite")
        );
    }

    #[test]
    fn test_fallbacks() {
        let lang_only = signals(r#"{"full_name": "a/my_tool", "language": "Go"}"#);
        assert_eq!(
            propose_description(&lang_only, &merged(Category::Other, &[])).as_deref(),
            Some("Go project: my tool")
        );

        let topics_only = signals(r#"{"full_name": "a/b"}"#);
        assert_eq!(
            propose_description(&topics_only, &merged(Category::Other, &["notes"])).as_deref(),
            Some("Project for notes")
        );

        let nothing = signals(r#"{"full_name": "a/dotfiles"}"#);
        assert_eq!(
            propose_description(&nothing, &merged(Category::Other, &[])).as_deref(),
            Some("Project: dotfiles")
        );
    }

    #[test]
    fn test_capped_length() {
        let long_name = "x".repeat(150);
        let s = signals(&format!(r#"{{"full_name": "a/{}"}}"#, long_name));
        let d = propose_description(&s, &merged(Category::Other, &[])).unwrap();
        assert!(d.chars().count() <= MAX_DESCRIPTION_LEN);
    }
}
