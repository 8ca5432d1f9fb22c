//! Classification merger
//!
//! Combines the rule candidate with the LLM outcome. When the LLM is
//! unavailable the merged result is the rule candidate, unchanged.

use crate::ai::LlmOutcome;
use crate::models::{
    topic_root, CandidateSource, ClassificationCandidate, ClassifiedTopic, MergedClassification,
    Provenance,
};
use std::collections::HashSet;

/// Merge a rule candidate with whatever the LLM produced.
///
/// - category: higher confidence wins, the rule candidate wins exact ties
/// - topics: shared topics (rule order), then LLM-only (LLM order), then
///   rule-only (vote rank); deduplicated by root and capped at `max_topics`
/// - confidence: the larger of the two
pub fn merge(
    rule: &ClassificationCandidate,
    llm: &LlmOutcome,
    max_topics: usize,
) -> MergedClassification {
    let llm = match llm {
        LlmOutcome::Candidate(candidate) => candidate,
        LlmOutcome::Unavailable(_) => return rule_only(rule, max_topics),
    };

    let (category, category_source) = if llm.confidence > rule.confidence {
        (llm.category, CandidateSource::Llm)
    } else {
        (rule.category, CandidateSource::Rule)
    };

    let llm_roots: HashSet<String> = llm.topics.iter().map(|t| topic_root(t)).collect();
    let rule_roots: HashSet<String> = rule.topics.iter().map(|t| topic_root(t)).collect();

    let shared = rule
        .topics
        .iter()
        .filter(|t| llm_roots.contains(&topic_root(t)))
        .map(|t| ClassifiedTopic::new(t.as_str(), Provenance::FromRule));
    let llm_only = llm
        .topics
        .iter()
        .filter(|t| !rule_roots.contains(&topic_root(t)))
        .map(|t| ClassifiedTopic::new(t.as_str(), Provenance::FromLlm));
    let rule_only = rule
        .topics
        .iter()
        .filter(|t| !llm_roots.contains(&topic_root(t)))
        .map(|t| ClassifiedTopic::new(t.as_str(), Provenance::FromRule));

    let mut seen = HashSet::new();
    let topics = shared
        .chain(llm_only)
        .chain(rule_only)
        .filter(|t| seen.insert(topic_root(&t.topic)))
        .take(max_topics)
        .collect();

    MergedClassification {
        category,
        category_source,
        topics,
        confidence: rule.confidence.max(llm.confidence),
        llm_used: true,
    }
}

fn rule_only(rule: &ClassificationCandidate, max_topics: usize) -> MergedClassification {
    MergedClassification {
        category: rule.category,
        category_source: CandidateSource::Rule,
        topics: rule
            .topics
            .iter()
            .take(max_topics)
            .map(|t| ClassifiedTopic::new(t.as_str(), Provenance::FromRule))
            .collect(),
        confidence: rule.confidence,
        llm_used: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::UnavailableReason;
    use crate::models::Category;

    fn candidate(
        category: Category,
        topics: &[&str],
        confidence: f64,
        source: CandidateSource,
    ) -> ClassificationCandidate {
        ClassificationCandidate {
            category,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            confidence,
            source,
            rationale: None,
        }
    }

    #[test]
    fn test_unavailable_returns_rule_candidate() {
        let rule = candidate(Category::Web, &["python", "flask"], 0.4, CandidateSource::Rule);
        let merged = merge(&rule, &LlmOutcome::Unavailable(UnavailableReason::NotConfigured), 10);
        assert_eq!(merged.category, Category::Web);
        assert_eq!(merged.topic_names(), vec!["python", "flask"]);
        assert!(merged.topics.iter().all(|t| t.provenance == Provenance::FromRule));
        assert_eq!(merged.confidence, 0.4);
        assert!(!merged.llm_used);
    }

    #[test]
    fn test_higher_confidence_wins_category() {
        let rule = candidate(Category::Library, &[], 0.3, CandidateSource::Rule);
        let llm = candidate(Category::Cli, &[], 0.8, CandidateSource::Llm);
        let merged = merge(&rule, &LlmOutcome::Candidate(llm), 10);
        assert_eq!(merged.category, Category::Cli);
        assert_eq!(merged.category_source, CandidateSource::Llm);
        assert_eq!(merged.confidence, 0.8);
    }

    #[test]
    fn test_rule_wins_exact_tie() {
        let rule = candidate(Category::Library, &[], 0.6, CandidateSource::Rule);
        let llm = candidate(Category::Cli, &[], 0.6, CandidateSource::Llm);
        let merged = merge(&rule, &LlmOutcome::Candidate(llm), 10);
        assert_eq!(merged.category, Category::Library);
        assert_eq!(merged.category_source, CandidateSource::Rule);
    }

    #[test]
    fn test_topic_order_shared_then_llm_then_rule() {
        let rule = candidate(
            Category::Web,
            &["python", "flask", "api", "docker"],
            0.5,
            CandidateSource::Rule,
        );
        let llm = candidate(
            Category::Web,
            &["rest-api", "flask", "sqlalchemy", "python"],
            0.7,
            CandidateSource::Llm,
        );
        let merged = merge(&rule, &LlmOutcome::Candidate(llm), 10);
        assert_eq!(
            merged.topic_names(),
            vec!["python", "flask", "rest-api", "sqlalchemy", "api", "docker"]
        );
        let provenance: Vec<Provenance> = merged.topics.iter().map(|t| t.provenance).collect();
        assert_eq!(
            provenance,
            vec![
                Provenance::FromRule,
                Provenance::FromRule,
                Provenance::FromLlm,
                Provenance::FromLlm,
                Provenance::FromRule,
                Provenance::FromRule,
            ]
        );
    }

    #[test]
    fn test_shared_matched_by_root() {
        let rule = candidate(Category::DataMl, &["machine-learning"], 0.5, CandidateSource::Rule);
        let llm = candidate(Category::DataMl, &["machinelearning", "nlp"], 0.5, CandidateSource::Llm);
        let merged = merge(&rule, &LlmOutcome::Candidate(llm), 10);
        assert_eq!(merged.topic_names(), vec!["machine-learning", "nlp"]);
    }

    #[test]
    fn test_cap_applied_after_ordering() {
        let rule = candidate(Category::Web, &["a", "b", "c"], 0.5, CandidateSource::Rule);
        let llm = candidate(Category::Web, &["x", "y", "a"], 0.5, CandidateSource::Llm);
        let merged = merge(&rule, &LlmOutcome::Candidate(llm), 3);
        assert_eq!(merged.topic_names(), vec!["a", "x", "y"]);
    }
}
