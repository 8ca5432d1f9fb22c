//! Output reporters for repolens results
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

use anyhow::{anyhow, Result};
use repolens::grouping::CategoryGroup;
use repolens::health::{HealthReport, PortfolioHealth, RuleSetRegistry};
use repolens::Assessment;
use serde::Serialize;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Health reports plus the portfolio summary, as one JSON document
#[derive(Debug, Serialize)]
pub struct HealthOutput<'a> {
    pub reports: &'a [HealthReport],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<&'a PortfolioHealth>,
}

/// Render assessments; `single` prints one JSON object instead of an array
pub fn assessments(items: &[Assessment], single: bool, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::assessments(items)),
        OutputFormat::Json if single && items.len() == 1 => json::render(&items[0]),
        OutputFormat::Json => json::render(items),
    }
}

pub fn health(
    reports: &[HealthReport],
    portfolio: Option<&PortfolioHealth>,
    single: bool,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::health(reports, portfolio)),
        OutputFormat::Json if single && reports.len() == 1 && portfolio.is_none() => {
            json::render(&reports[0])
        }
        OutputFormat::Json => json::render(&HealthOutput { reports, portfolio }),
    }
}

pub fn groups(groups: &[CategoryGroup], theme: &str, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::groups(groups, theme)),
        OutputFormat::Json => json::render(groups),
    }
}

pub fn rule_sets(registry: &RuleSetRegistry, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::rule_sets(registry)),
        OutputFormat::Json => json::rule_sets(registry),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use repolens::health::HealthEvaluator;
    use repolens::signals::{extract, RawSnapshot};
    use repolens::{AssessOptions, Engine};

    pub(crate) fn test_snapshot() -> RawSnapshot {
        serde_json::from_str(
            r#"{
                "full_name": "octo/todo-api",
                "languages": {"Python": 9000, "HTML": 1000},
                "readme": "A Flask app exposing a REST API.",
                "stargazers_count": 12
            }"#,
        )
        .expect("snapshot")
    }

    pub(crate) fn test_assessment() -> Assessment {
        Engine::builtin()
            .expect("engine")
            .assess(&test_snapshot(), &AssessOptions::default())
            .expect("assessment")
    }

    pub(crate) fn test_report() -> HealthReport {
        let signals = extract(&test_snapshot()).expect("signals");
        HealthEvaluator::builtin()
            .evaluate(&signals, "general")
            .expect("report")
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_single_vs_many_json() {
        let a = test_assessment();
        let one = assessments(std::slice::from_ref(&a), true, OutputFormat::Json).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&one).unwrap().is_object());
        let many = assessments(&[a.clone(), a], false, OutputFormat::Json).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&many)
                .unwrap()
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_health_json_with_portfolio() {
        let report = test_report();
        let reports = vec![report.clone(), report];
        let portfolio = PortfolioHealth::from_reports(&reports, 70.0, &Default::default());
        let out = health(&reports, Some(&portfolio), false, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["reports"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["portfolio"]["total"], 2);
    }
}
