//! Signal extraction
//!
//! Normalizes a raw repository snapshot into the canonical [`SignalSet`]
//! consumed by every downstream component. Extraction is pure: the only
//! failure is a snapshot without a usable `owner/name` identifier. Every
//! other field degrades to an empty or zero default.

mod readme;
mod snapshot;

pub use readme::{truncate_at_word, DEFAULT_README_LIMIT};
pub use snapshot::{RawFile, RawLicense, RawOwner, RawSnapshot};

use crate::error::{EngineError, EngineResult};
use crate::models::normalize_topic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Share precision for the language histogram (parts per million)
const SHARE_SCALE: f64 = 1_000_000.0;

/// License presence and identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSignal {
    pub present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdx_id: Option<String>,
}

/// Normalized, immutable facts about one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    /// `owner/name`
    pub identifier: String,
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    /// Language name to byte share; shares are non-negative and sum to at most 1.0
    pub languages: BTreeMap<String, f64>,
    /// Existing topics, normalized
    pub topics: BTreeSet<String>,
    /// README text, already truncated at a word boundary
    pub readme: String,
    /// Character count of the README before truncation
    pub readme_chars: usize,
    /// Top-level file and directory names of the default branch
    pub files: BTreeSet<String>,
    pub license: LicenseSignal,
    pub homepage: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub is_fork: bool,
    pub archived: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SignalSet {
    /// Language with the largest share (ties broken by name)
    pub fn primary_language(&self) -> Option<&str> {
        self.languages
            .iter()
            .fold(None::<(&String, f64)>, |best, (lang, share)| match best {
                Some((_, best_share)) if best_share >= *share => best,
                _ => Some((lang, *share)),
            })
            .map(|(lang, _)| lang.as_str())
    }

    /// Whether the README was cut to fit the limit
    pub fn readme_truncated(&self) -> bool {
        self.readme.chars().count() < self.readme_chars
    }

    /// Case-insensitive check for a top-level file or directory
    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    /// True when no classifier-relevant signal is present at all
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.languages.is_empty()
            && self.topics.is_empty()
            && self.readme.trim().is_empty()
            && self.files.is_empty()
    }
}

/// Extract a [`SignalSet`] using the default README limit
pub fn extract(raw: &RawSnapshot) -> EngineResult<SignalSet> {
    extract_with_limit(raw, DEFAULT_README_LIMIT)
}

/// Extract a [`SignalSet`], truncating the README to `readme_limit` characters
pub fn extract_with_limit(raw: &RawSnapshot, readme_limit: usize) -> EngineResult<SignalSet> {
    let (owner, name) = resolve_identifier(raw)?;
    let identifier = format!("{}/{}", owner, name);

    let description = raw
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let languages = language_shares(&raw.languages, raw.language.as_deref());
    if languages.is_empty() {
        debug!("{}: no language data", identifier);
    }

    let topics: BTreeSet<String> = raw.topics.iter().filter_map(|t| normalize_topic(t)).collect();

    let readme_raw = raw.readme.as_deref().unwrap_or("");
    let readme_chars = readme_raw.chars().count();
    let readme = truncate_at_word(readme_raw, readme_limit).to_string();
    if readme.chars().count() < readme_chars {
        debug!(
            "{}: README truncated from {} to {} chars",
            identifier,
            readme_chars,
            readme.chars().count()
        );
    }

    let files: BTreeSet<String> = raw
        .files
        .iter()
        .map(|f| f.name().trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();

    let spdx_id = raw.license.as_ref().and_then(|l| l.identifier());
    let license = LicenseSignal {
        present: spdx_id.is_some(),
        spdx_id,
    };

    let homepage = raw
        .homepage
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string);

    let last_updated = raw
        .updated_at
        .as_deref()
        .or(raw.pushed_at.as_deref())
        .and_then(|ts| parse_timestamp(&identifier, ts));

    Ok(SignalSet {
        identifier,
        owner,
        name,
        description,
        languages,
        topics,
        readme,
        readme_chars,
        files,
        license,
        homepage,
        stars: raw.stargazers_count,
        forks: raw.forks_count,
        watchers: raw.watchers_count,
        is_fork: raw.fork,
        archived: raw.archived,
        last_updated,
    })
}

/// Resolve `(owner, name)` from `full_name`, or `owner` + `name`
fn resolve_identifier(raw: &RawSnapshot) -> EngineResult<(String, String)> {
    if let Some(full_name) = raw.full_name.as_deref().map(str::trim) {
        if let Some((owner, name)) = full_name.split_once('/') {
            let (owner, name) = (owner.trim(), name.trim());
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') {
                return Ok((owner.to_string(), name.to_string()));
            }
        }
        if !full_name.is_empty() {
            return Err(EngineError::malformed(format!(
                "full_name '{}' is not in owner/name form",
                full_name
            )));
        }
    }

    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| EngineError::malformed("missing repository name"))?;
    let owner = raw
        .owner
        .as_ref()
        .map(|o| o.login().trim())
        .filter(|o| !o.is_empty())
        .ok_or_else(|| EngineError::malformed(format!("missing owner for repository '{}'", name)))?;

    Ok((owner.to_string(), name.to_string()))
}

/// Convert byte counts into shares, floored to parts per million
fn language_shares(bytes: &BTreeMap<String, f64>, primary: Option<&str>) -> BTreeMap<String, f64> {
    let usable: Vec<(&String, f64)> = bytes
        .iter()
        .filter(|(lang, count)| !lang.trim().is_empty() && count.is_finite() && **count > 0.0)
        .map(|(lang, count)| (lang, *count))
        .collect();
    let total: f64 = usable.iter().map(|(_, count)| count).sum();

    if total > 0.0 {
        return usable
            .into_iter()
            .map(|(lang, count)| {
                let share = (count / total * SHARE_SCALE).floor() / SHARE_SCALE;
                (lang.trim().to_string(), share)
            })
            .collect();
    }

    match primary.map(str::trim).filter(|p| !p.is_empty()) {
        Some(lang) => BTreeMap::from([(lang.to_string(), 1.0)]),
        None => BTreeMap::new(),
    }
}

fn parse_timestamp(identifier: &str, ts: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(ts.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            debug!("{}: ignoring unparseable timestamp '{}': {}", identifier, ts, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawSnapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_full_snapshot() {
        let snapshot = raw(r#"{
            "full_name": "octo/flask-api",
            "description": "  A Flask REST API  ",
            "languages": {"Python": 3000, "HTML": 1000},
            "topics": ["Web App", "flask"],
            "readme": "Flask REST API",
            "files": ["requirements.txt", "app.py"],
            "stargazers_count": 42,
            "license": {"spdx_id": "MIT"},
            "updated_at": "2024-05-01T12:00:00Z"
        }"#);
        let signals = extract(&snapshot).unwrap();
        assert_eq!(signals.identifier, "octo/flask-api");
        assert_eq!(signals.owner, "octo");
        assert_eq!(signals.description.as_deref(), Some("A Flask REST API"));
        assert_eq!(signals.languages["Python"], 0.75);
        assert_eq!(signals.languages["HTML"], 0.25);
        assert!(signals.topics.contains("web-app"));
        assert!(signals.topics.contains("flask"));
        assert!(signals.license.present);
        assert_eq!(signals.license.spdx_id.as_deref(), Some("MIT"));
        assert_eq!(signals.stars, 42);
        assert!(signals.last_updated.is_some());
        assert_eq!(signals.primary_language(), Some("Python"));
    }

    #[test]
    fn test_missing_identifier_is_malformed() {
        let err = extract(&raw(r#"{"description": "no name"}"#)).unwrap_err();
        assert!(matches!(err, EngineError::MalformedSnapshot { .. }));

        let err = extract(&raw(r#"{"name": "orphan"}"#)).unwrap_err();
        assert!(matches!(err, EngineError::MalformedSnapshot { .. }));

        let err = extract(&raw(r#"{"full_name": "no-slash"}"#)).unwrap_err();
        assert!(matches!(err, EngineError::MalformedSnapshot { .. }));
    }

    #[test]
    fn test_owner_and_name_fallback() {
        let signals = extract(&raw(r#"{"owner": {"login": "me"}, "name": "tool"}"#)).unwrap();
        assert_eq!(signals.identifier, "me/tool");
        assert!(signals.is_empty());
        assert!(signals.languages.is_empty());
        assert_eq!(signals.readme, "");
        assert!(!signals.license.present);
    }

    #[test]
    fn test_primary_language_used_without_byte_counts() {
        let signals = extract(&raw(r#"{"full_name": "a/b", "language": "Rust"}"#)).unwrap();
        assert_eq!(signals.languages.get("Rust"), Some(&1.0));
    }

    #[test]
    fn test_language_shares_never_exceed_one() {
        let snapshot = raw(r#"{"full_name": "a/b", "languages": {"A": 1, "B": 1, "C": 1, "Bad": -5}}"#);
        let signals = extract(&snapshot).unwrap();
        let sum: f64 = signals.languages.values().sum();
        assert!(sum <= 1.0 + 1e-9);
        assert!(!signals.languages.contains_key("Bad"));
        assert!(signals.languages.values().all(|s| *s >= 0.0));
    }

    #[test]
    fn test_readme_truncated_on_word_boundary() {
        let long = "word ".repeat(2000);
        let snapshot = RawSnapshot {
            full_name: Some("a/b".into()),
            readme: Some(long.clone()),
            ..Default::default()
        };
        let signals = extract_with_limit(&snapshot, 22).unwrap();
        assert_eq!(signals.readme, "word word word word");
        assert_eq!(signals.readme_chars, long.chars().count());
        assert!(signals.readme_truncated());
    }

    #[test]
    fn test_bad_timestamp_degrades() {
        let signals = extract(&raw(r#"{"full_name": "a/b", "updated_at": "yesterday"}"#)).unwrap();
        assert!(signals.last_updated.is_none());
    }

    #[test]
    fn test_has_file_case_insensitive() {
        let signals = extract(&raw(r#"{"full_name": "a/b", "files": ["LICENSE", "Dockerfile"]}"#)).unwrap();
        assert!(signals.has_file("license"));
        assert!(signals.has_file("dockerfile"));
        assert!(!signals.has_file("Makefile"));
    }
}
