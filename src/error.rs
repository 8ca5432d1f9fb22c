//! Engine error taxonomy
//!
//! Only `MalformedSnapshot` and `UnknownRuleSet` can surface while evaluating
//! a repository. The remaining variants are raised when configuration is
//! loaded or validated, before any repository is touched.

use thiserror::Error;

/// Errors surfaced by the classification and scoring engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Malformed snapshot: {reason}")]
    MalformedSnapshot { reason: String },

    #[error("Unknown rule set '{name}'. Available: {}", available.join(", "))]
    UnknownRuleSet { name: String, available: Vec<String> },

    #[error("Duplicate rule '{id}' in rule set '{rule_set}'")]
    DuplicateRule { rule_set: String, id: String },

    #[error("Invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("Invalid grade thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Invalid tag tables: {0}")]
    InvalidTables(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        EngineError::MalformedSnapshot {
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
