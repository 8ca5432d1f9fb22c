//! Health reports

use super::rules::{Outcome, RuleCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of issues listed in a report summary
pub const TOP_ISSUES_LIMIT: usize = 5;

/// Outcome of one rule for one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub id: String,
    pub description: String,
    pub category: RuleCategory,
    pub outcome: Outcome,
    pub weight: f64,
    /// Set when the predicate itself failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_suggestion: Option<String>,
}

/// Pass ratio for one rule category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub passed: usize,
    pub total: usize,
    /// Weighted score in [0, 100]
    pub score: f64,
}

/// A failed or warned rule worth fixing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub outcome: Outcome,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    /// Keyed by category name
    pub by_category: BTreeMap<String, CategoryScore>,
    pub top_issues: Vec<Issue>,
}

impl HealthSummary {
    pub fn from_results(results: &[RuleResult]) -> Self {
        let mut summary = HealthSummary::default();
        let mut weights: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for r in results {
            match r.outcome {
                Outcome::Pass => summary.passed += 1,
                Outcome::Warn => summary.warned += 1,
                Outcome::Fail => summary.failed += 1,
            }
            let key = r.category.as_str().to_string();
            let entry = summary.by_category.entry(key.clone()).or_default();
            entry.total += 1;
            if r.outcome == Outcome::Pass {
                entry.passed += 1;
            }
            let (earned, possible) = weights.entry(key).or_default();
            *earned += r.weight * r.outcome.value();
            *possible += r.weight;
        }

        for (key, (earned, possible)) in weights {
            if let Some(entry) = summary.by_category.get_mut(&key) {
                entry.score = weighted_score(earned, possible);
            }
        }

        let mut issues: Vec<(usize, &RuleResult)> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.outcome != Outcome::Pass)
            .collect();
        // Failed before warned, heavier first, then rule order
        issues.sort_by(|(ia, a), (ib, b)| {
            let rank = |o: Outcome| if o == Outcome::Fail { 0 } else { 1 };
            rank(a.outcome)
                .cmp(&rank(b.outcome))
                .then_with(|| b.weight.total_cmp(&a.weight))
                .then_with(|| ia.cmp(ib))
        });
        summary.top_issues = issues
            .into_iter()
            .take(TOP_ISSUES_LIMIT)
            .map(|(_, r)| Issue {
                id: r.id.clone(),
                outcome: r.outcome,
                weight: r.weight,
                fix_suggestion: r.fix_suggestion.clone(),
            })
            .collect();

        summary
    }
}

/// Health of one repository under one rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub identifier: String,
    pub rule_set: String,
    pub results: Vec<RuleResult>,
    /// Weighted score in [0, 100]
    pub score: f64,
    pub grade: String,
    pub summary: HealthSummary,
}

impl HealthReport {
    pub fn result(&self, id: &str) -> Option<&RuleResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn outcome(&self, id: &str) -> Option<Outcome> {
        self.result(id).map(|r| r.outcome)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RuleResult> {
        self.results.iter().filter(|r| r.outcome == Outcome::Fail)
    }
}

/// `100 × earned / possible`, clamped; 100 when nothing was possible
pub fn weighted_score(earned: f64, possible: f64) -> f64 {
    if possible <= 0.0 || !possible.is_finite() || !earned.is_finite() {
        return 100.0;
    }
    (100.0 * earned / possible).clamp(0.0, 100.0)
}
