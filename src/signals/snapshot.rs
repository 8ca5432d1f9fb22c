//! Raw repository snapshot as supplied by the repository data source
//!
//! Field names follow the code-hosting API so its JSON can be fed in
//! directly. Every field is optional: nulls, missing keys and values of the
//! wrong shape degrade to empty values instead of failing the decode. Lists
//! keep the elements that decode and drop the rest.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Deserialize a field, falling back to its default on `null` or a bad value
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        debug!("Ignoring snapshot field: {}", e);
        T::default()
    }))
}

/// Deserialize a list element by element, dropping elements that do not decode
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            debug!("Ignoring snapshot list field: expected an array, got {}", other);
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Ignoring snapshot list element: {}", e);
                None
            }
        })
        .collect())
}

/// Read-only snapshot of one repository
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub owner: Option<RawOwner>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    /// Primary language reported by the platform
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,
    /// Language name to byte count
    #[serde(default, deserialize_with = "lenient")]
    pub languages: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub topics: Vec<String>,
    #[serde(default, alias = "readme_text", deserialize_with = "lenient")]
    pub readme: Option<String>,
    /// Top-level entries of the default branch
    #[serde(default, alias = "file_names", deserialize_with = "lenient_vec")]
    pub files: Vec<RawFile>,
    #[serde(default, alias = "stars", deserialize_with = "lenient")]
    pub stargazers_count: u64,
    #[serde(default, alias = "forks", deserialize_with = "lenient")]
    pub forks_count: u64,
    #[serde(default, alias = "watchers", deserialize_with = "lenient")]
    pub watchers_count: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub license: Option<RawLicense>,
    #[serde(default, deserialize_with = "lenient")]
    pub archived: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub fork: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub pushed_at: Option<String>,
}

/// Owner as either a login object or a bare string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawOwner {
    Login { login: String },
    Name(String),
}

impl RawOwner {
    pub fn login(&self) -> &str {
        match self {
            RawOwner::Login { login } => login,
            RawOwner::Name(name) => name,
        }
    }
}

/// License as either an identifier or the platform's license object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLicense {
    Id(String),
    Object {
        #[serde(default, deserialize_with = "lenient")]
        spdx_id: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        key: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        name: Option<String>,
    },
}

impl RawLicense {
    /// Best available identifier, preferring the SPDX id
    pub fn identifier(&self) -> Option<String> {
        let id = match self {
            RawLicense::Id(id) => Some(id.as_str()),
            RawLicense::Object { spdx_id, key, name } => spdx_id
                .as_deref()
                .or(key.as_deref())
                .or(name.as_deref()),
        };
        id.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }
}

/// Directory entry as either a bare name or a contents-API object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFile {
    Name(String),
    Entry { name: String },
}

impl RawFile {
    pub fn name(&self) -> &str {
        match self {
            RawFile::Name(name) => name,
            RawFile::Entry { name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_platform_shape() {
        let json = r#"{
            "full_name": "octo/app",
            "owner": {"login": "octo", "id": 1},
            "name": "app",
            "description": null,
            "language": "Python",
            "languages": {"Python": 9000, "Shell": 1000},
            "topics": ["flask"],
            "files": [{"name": "README.md", "type": "file"}, "setup.py"],
            "stargazers_count": 12,
            "license": {"key": "mit", "spdx_id": "MIT", "name": "MIT License"},
            "archived": false,
            "updated_at": "2024-01-01T00:00:00Z",
            "unknown_field": [1, 2, 3]
        }"#;
        let raw: RawSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(raw.owner.as_ref().map(|o| o.login()), Some("octo"));
        assert_eq!(raw.languages.len(), 2);
        assert_eq!(raw.files[0].name(), "README.md");
        assert_eq!(raw.files[1].name(), "setup.py");
        assert_eq!(raw.license.unwrap().identifier().as_deref(), Some("MIT"));
        assert_eq!(raw.stargazers_count, 12);
    }

    #[test]
    fn test_nulls_degrade_to_defaults() {
        let json = r#"{"name": "x", "topics": null, "languages": null, "stargazers_count": null, "fork": null}"#;
        let raw: RawSnapshot = serde_json::from_str(json).unwrap();
        assert!(raw.topics.is_empty());
        assert!(raw.languages.is_empty());
        assert_eq!(raw.stargazers_count, 0);
        assert!(!raw.fork);
    }

    #[test]
    fn test_negative_counts_degrade_to_zero() {
        let raw: RawSnapshot =
            serde_json::from_str(r#"{"full_name": "a/b", "stargazers_count": -1, "forks_count": "many"}"#).unwrap();
        assert_eq!(raw.full_name.as_deref(), Some("a/b"));
        assert_eq!(raw.stargazers_count, 0);
        assert_eq!(raw.forks_count, 0);
    }

    #[test]
    fn test_unrecognized_owner_shape_is_dropped() {
        let raw: RawSnapshot = serde_json::from_str(r#"{"full_name": "a/b", "owner": {"id": 5}}"#).unwrap();
        assert!(raw.owner.is_none());
        assert_eq!(raw.full_name.as_deref(), Some("a/b"));
    }

    #[test]
    fn test_bad_list_elements_are_skipped() {
        let raw: RawSnapshot = serde_json::from_str(
            r#"{"full_name": "a/b", "topics": ["rust", null, 7], "files": [{"path": "src"}, "Cargo.toml"]}"#,
        )
        .unwrap();
        assert_eq!(raw.topics, vec!["rust"]);
        assert_eq!(raw.files.len(), 1);
        assert_eq!(raw.files[0].name(), "Cargo.toml");

        let not_a_list: RawSnapshot =
            serde_json::from_str(r#"{"full_name": "a/b", "topics": "rust", "files": {"a": 1}}"#).unwrap();
        assert!(not_a_list.topics.is_empty());
        assert!(not_a_list.files.is_empty());
    }

    #[test]
    fn test_wrong_scalar_types_degrade() {
        let raw: RawSnapshot = serde_json::from_str(
            r#"{
                "full_name": "a/b",
                "description": 42,
                "languages": ["Rust"],
                "license": {"spdx_id": 3, "key": "mit"},
                "archived": "yes",
                "updated_at": 1700000000
            }"#,
        )
        .unwrap();
        assert!(raw.description.is_none());
        assert!(raw.languages.is_empty());
        assert_eq!(raw.license.unwrap().identifier().as_deref(), Some("mit"));
        assert!(!raw.archived);
        assert!(raw.updated_at.is_none());
    }

    #[test]
    fn test_wrong_identifier_type_is_absent() {
        let raw: RawSnapshot = serde_json::from_str(r#"{"full_name": 12, "description": "x"}"#).unwrap();
        assert!(raw.full_name.is_none());
        assert!(crate::signals::extract(&raw).is_err());
    }

    #[test]
    fn test_license_identifier_fallbacks() {
        let by_key = RawLicense::Object {
            spdx_id: None,
            key: Some("apache-2.0".into()),
            name: None,
        };
        assert_eq!(by_key.identifier().as_deref(), Some("apache-2.0"));
        assert_eq!(RawLicense::Id("  ".into()).identifier(), None);
    }

    #[test]
    fn test_aliases() {
        let json = r#"{"name": "x", "owner": "me", "stars": 3, "readme_text": "hi", "file_names": ["a"]}"#;
        let raw: RawSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(raw.stargazers_count, 3);
        assert_eq!(raw.readme.as_deref(), Some("hi"));
        assert_eq!(raw.owner.unwrap().login(), "me");
        assert_eq!(raw.files.len(), 1);
    }
}
