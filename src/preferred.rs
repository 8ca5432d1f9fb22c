//! Preferred-tag resolution
//!
//! Relabels merged topics onto a caller-supplied tag vocabulary so that the
//! same concept gets the same tag across a whole portfolio. A preferred tag
//! only replaces a topic when its description (or the repository itself)
//! supports the connection; tags are never added on their own.

use crate::models::{
    normalize_topic, topic_root, ClassifiedTopic, MergedClassification, Provenance,
    DEFAULT_MAX_TOPICS,
};
use crate::signals::SignalSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "as", "at", "be", "based", "built", "by", "for", "from",
    "in", "into", "is", "it", "its", "of", "on", "or", "our", "that", "the", "their", "this",
    "to", "use", "used", "using", "via", "was", "with", "your",
];

/// Tag → human description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferredTags(pub BTreeMap<String, String>);

impl PreferredTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, description: impl Into<String>) {
        self.0.insert(tag.into(), description.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PreferredTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Final, cap-respecting topic list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalTopics {
    pub topics: Vec<ClassifiedTopic>,
    /// Topics dropped because no preferred tag covered them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
}

impl FinalTopics {
    pub fn names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.topic.as_str()).collect()
    }
}

struct PreparedTag {
    tag: String,
    tokens: HashSet<String>,
    keywords: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    Context,
    Description,
    Exact,
}

/// Compiled preferred-tag vocabulary
pub struct PreferredTagResolver {
    tags: Vec<PreparedTag>,
    max_topics: usize,
    preferred_only: bool,
}

impl PreferredTagResolver {
    pub fn new(preferred: &PreferredTags) -> Self {
        let tags = preferred
            .0
            .iter()
            .filter_map(|(tag, description)| {
                let tag = normalize_topic(tag)?;
                Some(PreparedTag {
                    tokens: tag.split('-').map(stem).collect(),
                    keywords: keywords(description),
                    tag,
                })
            })
            .collect();
        Self {
            tags,
            max_topics: DEFAULT_MAX_TOPICS,
            preferred_only: false,
        }
    }

    pub fn max_topics(mut self, max_topics: usize) -> Self {
        self.max_topics = max_topics;
        self
    }

    /// Drop topics that no preferred tag covers
    pub fn preferred_only(mut self, preferred_only: bool) -> Self {
        self.preferred_only = preferred_only;
        self
    }

    /// Resolve the merged topics, using `context` for contextual matches
    pub fn resolve(&self, merged: &MergedClassification, context: Option<&SignalSet>) -> FinalTopics {
        let context_words = context.map(context_words).unwrap_or_default();

        let mut dropped = Vec::new();
        let mapped: Vec<ClassifiedTopic> = merged
            .topics
            .iter()
            .filter_map(|topic| match self.best_match(&topic.topic, &context_words) {
                Some((tag, MatchKind::Exact)) => {
                    Some(ClassifiedTopic::new(tag, topic.provenance))
                }
                Some((tag, _)) => {
                    debug!("preferred tag '{}' replaces '{}'", tag, topic.topic);
                    Some(ClassifiedTopic::new(tag, Provenance::FromPreferred))
                }
                None if self.preferred_only => {
                    dropped.push(topic.topic.clone());
                    None
                }
                None => Some(topic.clone()),
            })
            .collect();

        let mut seen = HashSet::new();
        let topics = mapped
            .into_iter()
            .filter(|t| seen.insert(topic_root(&t.topic)))
            .take(self.max_topics)
            .collect();

        FinalTopics { topics, dropped }
    }

    /// Best tag for `topic`: exact match, then most overlapping tokens, then tag order
    fn best_match(&self, topic: &str, context_words: &HashSet<String>) -> Option<(&str, MatchKind)> {
        let topic_tokens: Vec<String> = topic.split('-').filter(|t| !t.is_empty()).map(stem).collect();
        if topic_tokens.is_empty() {
            return None;
        }

        let mut best: Option<(&PreparedTag, MatchKind, usize)> = None;
        for prepared in &self.tags {
            let Some((kind, overlap)) = match_tag(prepared, topic, &topic_tokens, context_words) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, best_kind, best_overlap)) => (kind, overlap) > (best_kind, best_overlap),
            };
            if better {
                best = Some((prepared, kind, overlap));
            }
        }
        best.map(|(prepared, kind, _)| (prepared.tag.as_str(), kind))
    }
}

fn match_tag(
    prepared: &PreparedTag,
    topic: &str,
    topic_tokens: &[String],
    context_words: &HashSet<String>,
) -> Option<(MatchKind, usize)> {
    if prepared.tag == topic {
        return Some((MatchKind::Exact, topic_tokens.len()));
    }

    let in_description = topic_tokens
        .iter()
        .filter(|t| prepared.keywords.contains(*t))
        .count();

    let covered = topic_tokens
        .iter()
        .all(|t| prepared.keywords.contains(t) || prepared.tokens.contains(t));
    if covered && in_description > 0 {
        return Some((MatchKind::Description, in_description));
    }

    let tag_in_context = prepared.tokens.iter().all(|t| context_words.contains(t));
    if tag_in_context && in_description > 0 {
        return Some((MatchKind::Context, in_description));
    }

    None
}

/// Resolve with default options and no repository context
pub fn resolve(merged: &MergedClassification, preferred: &PreferredTags) -> FinalTopics {
    PreferredTagResolver::new(preferred).resolve(merged, None)
}

/// Naive singular form so "apis" and "api" compare equal
fn stem(word: &str) -> String {
    let word = word.to_lowercase();
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2)
        .map(stem)
}

fn keywords(text: &str) -> HashSet<String> {
    words(text).filter(|w| !STOPWORDS.contains(&w.as_str())).collect()
}

fn context_words(signals: &SignalSet) -> HashSet<String> {
    let mut out: HashSet<String> = keywords(&signals.readme);
    out.extend(keywords(signals.description.as_deref().unwrap_or("")));
    out.extend(keywords(&signals.name));
    for topic in &signals.topics {
        out.extend(keywords(topic));
    }
    out
}
