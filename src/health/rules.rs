//! Health rules and their predicates
//!
//! A rule is data: an id, a weight, a category and a predicate. Predicates
//! are either one of the built-in [`Check`]s, which can be written in a
//! config file, or a custom closure registered from code.

use crate::classifier::file_pattern_match;
use crate::signals::SignalSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome of one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Warn,
    Fail,
}

impl Outcome {
    /// Contribution to the weighted score
    pub fn value(&self) -> f64 {
        match self {
            Outcome::Pass => 1.0,
            Outcome::Warn => 0.5,
            Outcome::Fail => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Warn => "warn",
            Outcome::Fail => "fail",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Area of repository hygiene a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Documentation,
    Metadata,
    Legal,
    Community,
    Maintenance,
    #[default]
    Quality,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Documentation => "documentation",
            RuleCategory::Metadata => "metadata",
            RuleCategory::Legal => "legal",
            RuleCategory::Community => "community",
            RuleCategory::Maintenance => "maintenance",
            RuleCategory::Quality => "quality",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs shared by every predicate in one evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    /// Reference time for staleness checks
    pub now: DateTime<Utc>,
}

impl EvalContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self { now: Utc::now() }
    }
}

fn one() -> usize {
    1
}

/// Built-in, config-expressible checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// Fail without a description, warn below `min_length` characters
    HasDescription {
        #[serde(default)]
        min_length: usize,
    },
    /// Fail without a license
    HasLicense,
    /// Fail without a license, warn when it is not one of `licenses`
    LicenseIn { licenses: Vec<String> },
    /// Fail without a README, warn below `min_length` characters
    HasReadme {
        #[serde(default)]
        min_length: usize,
    },
    /// Pass when at least `min_matches` keywords occur (default: all), warn on some
    ReadmeMentions {
        keywords: Vec<String>,
        #[serde(default)]
        min_matches: Option<usize>,
    },
    /// Fail without topics, warn below `min`
    HasTopics {
        #[serde(default = "one")]
        min: usize,
    },
    /// Pass when any top-level entry matches one of `names`
    HasFile { names: Vec<String> },
    HasHomepage,
    /// Pass within `days`, warn within `warn_days`, warn when the date is unknown
    UpdatedWithin {
        days: i64,
        #[serde(default)]
        warn_days: Option<i64>,
    },
    NotArchived,
    /// Pass at `stars` or more, warn on any stars
    MinStars { stars: u64 },
}

impl Check {
    /// Reject parameters that can never evaluate sensibly
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Check::LicenseIn { licenses } if licenses.is_empty() => {
                Err("license_in needs at least one license".to_string())
            }
            Check::ReadmeMentions { keywords, .. } if keywords.is_empty() => {
                Err("readme_mentions needs at least one keyword".to_string())
            }
            Check::ReadmeMentions {
                keywords,
                min_matches: Some(n),
            } if *n == 0 || *n > keywords.len() => Err(format!(
                "readme_mentions min_matches must be between 1 and {}",
                keywords.len()
            )),
            Check::HasFile { names } if names.is_empty() => {
                Err("has_file needs at least one name".to_string())
            }
            Check::UpdatedWithin { days, .. } if *days <= 0 => {
                Err("updated_within days must be positive".to_string())
            }
            Check::UpdatedWithin {
                days,
                warn_days: Some(warn),
            } if warn < days => Err("updated_within warn_days must be at least days".to_string()),
            _ => Ok(()),
        }
    }

    pub fn evaluate(&self, signals: &SignalSet, ctx: &EvalContext) -> Outcome {
        match self {
            Check::HasDescription { min_length } => match &signals.description {
                None => Outcome::Fail,
                Some(d) if d.chars().count() < *min_length => Outcome::Warn,
                Some(_) => Outcome::Pass,
            },
            Check::HasLicense => pass_if(signals.license.present),
            Check::LicenseIn { licenses } => match &signals.license.spdx_id {
                _ if !signals.license.present => Outcome::Fail,
                Some(id) if licenses.iter().any(|l| l.eq_ignore_ascii_case(id)) => Outcome::Pass,
                _ => Outcome::Warn,
            },
            Check::HasReadme { min_length } => {
                if signals.readme.trim().is_empty() {
                    Outcome::Fail
                } else if signals.readme_chars < *min_length {
                    Outcome::Warn
                } else {
                    Outcome::Pass
                }
            }
            Check::ReadmeMentions {
                keywords,
                min_matches,
            } => {
                let readme = signals.readme.to_lowercase();
                let found = keywords
                    .iter()
                    .filter(|k| readme.contains(&k.to_lowercase()))
                    .count();
                let needed = min_matches.unwrap_or(keywords.len());
                if found >= needed {
                    Outcome::Pass
                } else if found > 0 {
                    Outcome::Warn
                } else {
                    Outcome::Fail
                }
            }
            Check::HasTopics { min } => match signals.topics.len() {
                0 => Outcome::Fail,
                n if n < *min => Outcome::Warn,
                _ => Outcome::Pass,
            },
            Check::HasFile { names } => pass_if(
                names
                    .iter()
                    .any(|n| signals.files.iter().any(|f| file_pattern_match(n, f))),
            ),
            Check::HasHomepage => pass_if(signals.homepage.is_some()),
            Check::UpdatedWithin { days, warn_days } => match signals.last_updated {
                None => Outcome::Warn,
                Some(updated) => {
                    let age = (ctx.now - updated).num_days();
                    if age <= *days {
                        Outcome::Pass
                    } else if warn_days.is_some_and(|w| age <= w) {
                        Outcome::Warn
                    } else {
                        Outcome::Fail
                    }
                }
            },
            Check::NotArchived => pass_if(!signals.archived),
            Check::MinStars { stars } => {
                if signals.stars >= *stars {
                    Outcome::Pass
                } else if signals.stars > 0 {
                    Outcome::Warn
                } else {
                    Outcome::Fail
                }
            }
        }
    }
}

fn pass_if(condition: bool) -> Outcome {
    if condition {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

/// Predicate closure signature for rules registered from code
pub type CustomPredicate = dyn Fn(&SignalSet, &EvalContext) -> Result<Outcome, String> + Send + Sync;

#[derive(Clone)]
pub enum Predicate {
    Check(Check),
    Custom(Arc<CustomPredicate>),
}

impl Predicate {
    pub fn evaluate(&self, signals: &SignalSet, ctx: &EvalContext) -> Result<Outcome, String> {
        match self {
            Predicate::Check(check) => Ok(check.evaluate(signals, ctx)),
            Predicate::Custom(f) => f(signals, ctx),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Check(check) => f.debug_tuple("Check").field(check).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A weighted health rule
#[derive(Debug, Clone)]
pub struct HealthRule {
    pub id: String,
    pub description: String,
    pub category: RuleCategory,
    pub weight: f64,
    pub fix_suggestion: Option<String>,
    pub predicate: Predicate,
}

impl HealthRule {
    pub fn new(id: impl Into<String>, description: impl Into<String>, check: Check) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            category: RuleCategory::default(),
            weight: 1.0,
            fix_suggestion: None,
            predicate: Predicate::Check(check),
        }
    }

    /// Rule backed by a closure; `Err` and panics both count as a failed rule
    pub fn custom<F>(id: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&SignalSet, &EvalContext) -> Result<Outcome, String> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            description: description.into(),
            category: RuleCategory::default(),
            weight: 1.0,
            fix_suggestion: None,
            predicate: Predicate::Custom(Arc::new(f)),
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.fix_suggestion = Some(suggestion.into());
        self
    }

    /// The check behind this rule, if it is not a closure
    pub fn check(&self) -> Option<&Check> {
        match &self.predicate {
            Predicate::Check(check) => Some(check),
            Predicate::Custom(_) => None,
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Serializable form of a check-backed rule, as written in config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: RuleCategory,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub fix_suggestion: Option<String>,
    #[serde(flatten)]
    pub check: Check,
}

impl From<RuleSpec> for HealthRule {
    fn from(spec: RuleSpec) -> Self {
        let description = if spec.description.trim().is_empty() {
            spec.id.replace('_', " ")
        } else {
            spec.description
        };
        HealthRule {
            id: spec.id,
            description,
            category: spec.category,
            weight: spec.weight,
            fix_suggestion: spec.fix_suggestion,
            predicate: Predicate::Check(spec.check),
        }
    }
}
