//! Named rule sets
//!
//! Rule sets are data: adding one never touches the evaluator.

use super::rules::{Check, HealthRule, RuleCategory};
use crate::error::{EngineError, EngineResult};
use std::collections::{BTreeMap, HashSet};

/// Licenses accepted without a warning by the `professional` rule set
pub const PERMISSIVE_AND_COMMON_LICENSES: &[&str] = &[
    "MIT",
    "Apache-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "ISC",
    "MPL-2.0",
    "GPL-2.0",
    "GPL-3.0",
    "LGPL-3.0",
    "AGPL-3.0",
];

/// Registered rule sets, keyed by name
#[derive(Debug, Clone, Default)]
pub struct RuleSetRegistry {
    sets: BTreeMap<String, Vec<HealthRule>>,
}

impl RuleSetRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `general`, `academic` and `professional`
    pub fn builtin() -> Self {
        let mut sets = BTreeMap::new();
        sets.insert("general".to_string(), general_rules());
        sets.insert("academic".to_string(), academic_rules());
        sets.insert("professional".to_string(), professional_rules());
        Self { sets }
    }

    /// Add or replace a named rule set after validating it
    pub fn register(&mut self, name: impl Into<String>, rules: Vec<HealthRule>) -> EngineResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::Config("rule set name cannot be empty".to_string()));
        }
        validate_rules(&name, &rules)?;
        self.sets.insert(name, rules);
        Ok(())
    }

    pub fn get(&self, name: &str) -> EngineResult<&[HealthRule]> {
        self.sets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownRuleSet {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HealthRule])> {
        self.sets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn validate_rules(rule_set: &str, rules: &[HealthRule]) -> EngineResult<()> {
    let mut seen = HashSet::new();
    for rule in rules {
        if rule.id.trim().is_empty() {
            return Err(EngineError::InvalidRule {
                id: rule.id.clone(),
                reason: format!("empty rule id in rule set '{}'", rule_set),
            });
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(EngineError::DuplicateRule {
                rule_set: rule_set.to_string(),
                id: rule.id.clone(),
            });
        }
        if !rule.weight.is_finite() || rule.weight <= 0.0 {
            return Err(EngineError::InvalidRule {
                id: rule.id.clone(),
                reason: format!("weight must be a positive number, got {}", rule.weight),
            });
        }
        if let Some(check) = rule.check() {
            check.validate().map_err(|reason| EngineError::InvalidRule {
                id: rule.id.clone(),
                reason,
            })?;
        }
    }
    Ok(())
}

fn missing_description(weight: f64) -> HealthRule {
    HealthRule::new(
        "missing_description",
        "Repository has a description",
        Check::HasDescription { min_length: 0 },
    )
    .category(RuleCategory::Metadata)
    .weight(weight)
    .fix("Add a one-line description in the repository settings")
}

fn missing_readme(min_length: usize, weight: f64) -> HealthRule {
    HealthRule::new(
        "missing_readme",
        "Repository has a substantial README",
        Check::HasReadme { min_length },
    )
    .category(RuleCategory::Documentation)
    .weight(weight)
    .fix("Write a README explaining what the project does and how to use it")
}

fn missing_license(weight: f64) -> HealthRule {
    HealthRule::new("missing_license", "Repository declares a license", Check::HasLicense)
        .category(RuleCategory::Legal)
        .weight(weight)
        .fix("Add a LICENSE file so others know how they may use the code")
}

fn missing_topics(min: usize, weight: f64) -> HealthRule {
    HealthRule::new(
        "missing_topics",
        "Repository is tagged with topics",
        Check::HasTopics { min },
    )
    .category(RuleCategory::Metadata)
    .weight(weight)
    .fix("Add topics so the repository can be discovered")
}

fn stale_repository(days: i64, warn_days: i64, weight: f64) -> HealthRule {
    HealthRule::new(
        "stale_repository",
        "Repository was updated recently",
        Check::UpdatedWithin {
            days,
            warn_days: Some(warn_days),
        },
    )
    .category(RuleCategory::Maintenance)
    .weight(weight)
    .fix("Archive the repository or note its maintenance status in the README")
}

fn archived_repository() -> HealthRule {
    HealthRule::new("archived_repository", "Repository is not archived", Check::NotArchived)
        .category(RuleCategory::Maintenance)
        .weight(1.0)
        .fix("Unarchive the repository or exclude it from the portfolio")
}

fn general_rules() -> Vec<HealthRule> {
    vec![
        missing_description(3.0),
        missing_readme(200, 3.0),
        missing_license(2.0),
        missing_topics(3, 2.0),
        stale_repository(365, 730, 1.0),
        archived_repository(),
    ]
}

fn academic_rules() -> Vec<HealthRule> {
    vec![
        missing_description(3.0),
        missing_readme(500, 3.0),
        missing_license(2.0),
        HealthRule::new(
            "missing_citation",
            "Repository explains how to cite it",
            Check::HasFile {
                names: vec!["CITATION.cff".into(), "CITATION".into(), "CITATION.bib".into()],
            },
        )
        .category(RuleCategory::Documentation)
        .weight(2.0)
        .fix("Add a CITATION.cff file with authors and a DOI"),
        HealthRule::new(
            "missing_usage_docs",
            "README covers installation and usage",
            Check::ReadmeMentions {
                keywords: vec!["install".into(), "usage".into()],
                min_matches: None,
            },
        )
        .category(RuleCategory::Documentation)
        .weight(2.0)
        .fix("Add Installation and Usage sections to the README"),
        HealthRule::new(
            "missing_environment",
            "Dependencies are pinned for reproducibility",
            Check::HasFile {
                names: vec![
                    "requirements.txt".into(),
                    "environment.yml".into(),
                    "pyproject.toml".into(),
                    "Dockerfile".into(),
                    "renv.lock".into(),
                    "Project.toml".into(),
                ],
            },
        )
        .category(RuleCategory::Quality)
        .weight(1.0)
        .fix("Commit a requirements.txt, environment.yml or equivalent"),
        missing_topics(3, 1.0),
    ]
}

fn professional_rules() -> Vec<HealthRule> {
    vec![
        missing_description(3.0),
        missing_readme(300, 3.0),
        HealthRule::new(
            "missing_license",
            "Repository uses a widely recognised license",
            Check::LicenseIn {
                licenses: PERMISSIVE_AND_COMMON_LICENSES.iter().map(|l| l.to_string()).collect(),
            },
        )
        .category(RuleCategory::Legal)
        .weight(3.0)
        .fix("Add a standard OSI license such as MIT or Apache-2.0"),
        missing_topics(3, 2.0),
        HealthRule::new("missing_homepage", "Repository links a homepage", Check::HasHomepage)
            .category(RuleCategory::Metadata)
            .weight(1.0)
            .fix("Set the homepage to the documentation site or a live demo"),
        HealthRule::new(
            "missing_contributing",
            "Repository has contribution guidelines",
            Check::HasFile {
                names: vec!["CONTRIBUTING*".into()],
            },
        )
        .category(RuleCategory::Community)
        .weight(1.0)
        .fix("Add a CONTRIBUTING.md describing how to propose changes"),
        HealthRule::new(
            "missing_tests",
            "Repository contains tests",
            Check::HasFile {
                names: vec!["tests/".into(), "test/".into(), "spec/".into(), "__tests__/".into()],
            },
        )
        .category(RuleCategory::Quality)
        .weight(2.0)
        .fix("Add an automated test suite"),
        HealthRule::new(
            "missing_ci",
            "Repository runs continuous integration",
            Check::HasFile {
                names: vec![
                    ".github/".into(),
                    ".gitlab-ci.yml".into(),
                    ".circleci/".into(),
                    ".travis.yml".into(),
                    "Jenkinsfile".into(),
                ],
            },
        )
        .category(RuleCategory::Quality)
        .weight(1.0)
        .fix("Add a CI workflow that runs the tests on every push"),
        stale_repository(180, 365, 1.0),
        archived_repository(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Outcome;

    #[test]
    fn test_builtin_sets_are_valid() {
        let registry = RuleSetRegistry::builtin();
        assert_eq!(registry.names(), vec!["academic", "general", "professional"]);
        for (name, rules) in registry.iter() {
            validate_rules(name, rules).unwrap();
            assert!(!rules.is_empty());
        }
    }

    #[test]
    fn test_unknown_rule_set() {
        let err = RuleSetRegistry::builtin().get("corporate").unwrap_err();
        match err {
            EngineError::UnknownRuleSet { name, available } => {
                assert_eq!(name, "corporate");
                assert_eq!(available.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut registry = RuleSetRegistry::new();
        let rules = vec![
            HealthRule::custom("dup", "first", |_, _| Ok(Outcome::Pass)),
            HealthRule::custom("dup", "second", |_, _| Ok(Outcome::Pass)),
        ];
        assert!(matches!(
            registry.register("custom", rules),
            Err(EngineError::DuplicateRule { .. })
        ));
        assert!(!registry.contains("custom"));
    }

    #[test]
    fn test_same_id_allowed_across_sets() {
        let mut registry = RuleSetRegistry::new();
        registry
            .register("a", vec![HealthRule::new("x", "x", Check::HasLicense)])
            .unwrap();
        registry
            .register("b", vec![HealthRule::new("x", "x", Check::HasLicense)])
            .unwrap();
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let mut registry = RuleSetRegistry::new();
        let rules = vec![HealthRule::new("x", "x", Check::HasLicense).weight(-1.0)];
        assert!(matches!(
            registry.register("bad", rules),
            Err(EngineError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RuleSetRegistry::builtin();
        registry
            .register("general", vec![HealthRule::new("only", "only", Check::NotArchived)])
            .unwrap();
        assert_eq!(registry.get("general").unwrap().len(), 1);
    }
}
