//! Health rule engine
//!
//! Evaluates a named, weighted rule set against a [`SignalSet`]:
//!
//! ```text
//! score = 100 × Σ(weight × value) / Σ(weight)    pass = 1.0, warn = 0.5, fail = 0.0
//! ```
//!
//! Every rule runs in isolation. A predicate that returns `Err` or panics is
//! recorded as `fail` with an internal-error note and the remaining rules
//! are evaluated as usual.

mod grade;
mod portfolio;
mod registry;
mod report;
mod rules;

pub use grade::{GradeThreshold, GradeThresholds};
pub use portfolio::{GradeCount, PortfolioHealth};
pub use registry::{RuleSetRegistry, PERMISSIVE_AND_COMMON_LICENSES};
pub use report::{
    weighted_score, CategoryScore, HealthReport, HealthSummary, Issue, RuleResult, TOP_ISSUES_LIMIT,
};
pub use rules::{Check, CustomPredicate, EvalContext, HealthRule, Outcome, Predicate, RuleCategory, RuleSpec};

use crate::error::EngineResult;
use crate::signals::SignalSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// Rule sets plus grade thresholds, shared across evaluations
#[derive(Debug, Clone, Default)]
pub struct HealthEvaluator {
    registry: RuleSetRegistry,
    grades: GradeThresholds,
}

impl HealthEvaluator {
    pub fn new(registry: RuleSetRegistry, grades: GradeThresholds) -> Self {
        Self { registry, grades }
    }

    /// Built-in rule sets with the default A–F thresholds
    pub fn builtin() -> Self {
        Self::new(RuleSetRegistry::builtin(), GradeThresholds::default())
    }

    pub fn registry(&self) -> &RuleSetRegistry {
        &self.registry
    }

    pub fn grades(&self) -> &GradeThresholds {
        &self.grades
    }

    /// Evaluate `rule_set` against `signals` as of now
    pub fn evaluate(&self, signals: &SignalSet, rule_set: &str) -> EngineResult<HealthReport> {
        self.evaluate_with(signals, rule_set, &EvalContext::default())
    }

    pub fn evaluate_with(
        &self,
        signals: &SignalSet,
        rule_set: &str,
        ctx: &EvalContext,
    ) -> EngineResult<HealthReport> {
        let rules = self.registry.get(rule_set)?;

        let results: Vec<RuleResult> = rules
            .iter()
            .map(|rule| {
                let (outcome, note) = run_isolated(rule, signals, ctx);
                RuleResult {
                    id: rule.id.clone(),
                    description: rule.description.clone(),
                    category: rule.category,
                    outcome,
                    weight: rule.weight,
                    note,
                    fix_suggestion: rule.fix_suggestion.clone(),
                }
            })
            .collect();

        let (earned, possible) = results.iter().fold((0.0, 0.0), |(e, p), r| {
            (e + r.weight * r.outcome.value(), p + r.weight)
        });
        let score = weighted_score(earned, possible);
        let grade = self.grades.grade_for(score).to_string();
        let summary = HealthSummary::from_results(&results);

        Ok(HealthReport {
            identifier: signals.identifier.clone(),
            rule_set: rule_set.to_string(),
            results,
            score,
            grade,
            summary,
        })
    }
}

/// Evaluate one rule, turning errors and panics into a noted `fail`
fn run_isolated(rule: &HealthRule, signals: &SignalSet, ctx: &EvalContext) -> (Outcome, Option<String>) {
    let result = catch_unwind(AssertUnwindSafe(|| rule.predicate.evaluate(signals, ctx)));
    match result {
        Ok(Ok(outcome)) => (outcome, None),
        Ok(Err(msg)) => {
            warn!("{}: rule '{}' failed: {}", signals.identifier, rule.id, msg);
            (Outcome::Fail, Some(format!("internal error: {}", msg)))
        }
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            warn!("{}: rule '{}' panicked: {}", signals.identifier, rule.id, msg);
            (Outcome::Fail, Some(format!("internal error: {}", msg)))
        }
    }
}
