//! JSON reporter
//!
//! Pretty-printed JSON for piping to jq or further processing.

use anyhow::Result;
use repolens::health::{Check, RuleCategory, RuleSetRegistry};
use serde::Serialize;

/// Render any record as JSON
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Serialize)]
struct RuleView<'a> {
    id: &'a str,
    description: &'a str,
    category: RuleCategory,
    weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<&'a Check>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix_suggestion: Option<&'a str>,
}

#[derive(Serialize)]
struct RuleSetView<'a> {
    name: &'a str,
    rules: Vec<RuleView<'a>>,
}

/// Rule sets with their rules; code-defined predicates have no `check`
pub fn rule_sets(registry: &RuleSetRegistry) -> Result<String> {
    let sets: Vec<RuleSetView> = registry
        .iter()
        .map(|(name, rules)| RuleSetView {
            name,
            rules: rules
                .iter()
                .map(|r| RuleView {
                    id: &r.id,
                    description: &r.description,
                    category: r.category,
                    weight: r.weight,
                    check: r.check(),
                    fix_suggestion: r.fix_suggestion.as_deref(),
                })
                .collect(),
        })
        .collect();
    render(&sets)
}
