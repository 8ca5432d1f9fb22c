//! Text (terminal) reporter with colors and formatting

use console::{style, StyledObject};
use repolens::grouping::CategoryGroup;
use repolens::health::{HealthReport, Outcome, PortfolioHealth, RuleSetRegistry};
use repolens::models::{CandidateSource, Provenance};
use repolens::Assessment;
use std::fmt::Write;

fn grade_style(grade: &str) -> StyledObject<&str> {
    match grade {
        "A" => style(grade).green().bold(),
        "B" => style(grade).green(),
        "C" => style(grade).yellow(),
        "D" => style(grade).red(),
        "F" => style(grade).red().bold(),
        _ => style(grade).bold(),
    }
}

fn outcome_tag(outcome: Outcome) -> StyledObject<&'static str> {
    match outcome {
        Outcome::Pass => style("[pass]").green(),
        Outcome::Warn => style("[warn]").yellow(),
        Outcome::Fail => style("[fail]").red(),
    }
}

fn provenance_mark(provenance: Provenance) -> &'static str {
    match provenance {
        Provenance::FromRule => "",
        Provenance::FromLlm => "*",
        Provenance::FromPreferred => "+",
    }
}

/// Classification, topics and (when present) health for each repository
pub fn assessments(items: &[Assessment]) -> String {
    let mut out = String::new();
    for a in items {
        let c = &a.classification;
        let _ = writeln!(out, "\n{}", style(&a.identifier).bold());
        let _ = writeln!(
            out,
            "  Category:  {} {}",
            style(c.category).cyan(),
            style(format!(
                "({:.2}, {}{})",
                c.confidence,
                match c.category_source {
                    CandidateSource::Rule => "rules",
                    CandidateSource::Llm => "llm",
                },
                if c.llm_used { ", llm consulted" } else { "" }
            ))
            .dim()
        );
        let topics: Vec<String> = a
            .topics
            .topics
            .iter()
            .map(|t| format!("{}{}", t.topic, provenance_mark(t.provenance)))
            .collect();
        let _ = writeln!(out, "  Topics:    {}", topics.join(", "));
        if !a.new_topics.is_empty() {
            let _ = writeln!(out, "  New:       {}", style(a.new_topics.join(", ")).green());
        }
        if !a.topics.dropped.is_empty() {
            let _ = writeln!(out, "  Dropped:   {}", style(a.topics.dropped.join(", ")).dim());
        }
        if let Some(description) = &a.proposed_description {
            let _ = writeln!(out, "  Suggested: {}", description);
        }
        let _ = writeln!(
            out,
            "  Group:     {} {}",
            a.bucket.heading,
            style(format!("(#{} in {})", a.bucket.sort_key + 1, a.bucket.theme)).dim()
        );
        if let Some(report) = &a.health {
            let _ = writeln!(
                out,
                "  Health:    {:.1}/100  Grade {}  ({} rules)",
                report.score,
                grade_style(&report.grade),
                report.rule_set
            );
            for issue in &report.summary.top_issues {
                let _ = writeln!(out, "    {} {}", outcome_tag(issue.outcome), issue.id);
            }
        }
    }
    if items.len() > 1 {
        let _ = writeln!(out, "\n{} repositories", items.len());
    }
    out
}

fn report(out: &mut String, report: &HealthReport) {
    let _ = writeln!(
        out,
        "\n{}  {:.1}/100  Grade {}  {}",
        style(&report.identifier).bold(),
        report.score,
        grade_style(&report.grade),
        style(format!("({})", report.rule_set)).dim()
    );
    let s = &report.summary;
    let _ = writeln!(out, "  {} passed, {} warned, {} failed", s.passed, s.warned, s.failed);
    for r in &report.results {
        let _ = write!(out, "  {} {:<24} {}", outcome_tag(r.outcome), r.id, style(&r.description).dim());
        if let Some(note) = &r.note {
            let _ = write!(out, "  {}", style(note).red());
        }
        out.push('\n');
        if r.outcome != Outcome::Pass {
            if let Some(fix) = &r.fix_suggestion {
                let _ = writeln!(out, "         {} {}", style("fix:").dim(), fix);
            }
        }
    }
}

pub fn health(reports: &[HealthReport], portfolio: Option<&PortfolioHealth>) -> String {
    let mut out = String::new();
    for r in reports {
        report(&mut out, r);
    }

    if let Some(p) = portfolio {
        let _ = writeln!(out, "\n{}", style("PORTFOLIO").bold());
        let _ = writeln!(
            out,
            "  {} repositories, average {:.1}, {} at or above {:.0}, {} below",
            p.total, p.average_score, p.passed, p.min_score, p.failed
        );
        let dist: Vec<String> = p
            .grade_distribution
            .iter()
            .map(|g| format!("{} {}", grade_style(&g.grade), g.count))
            .collect();
        let _ = writeln!(out, "  Grades: {}", dist.join("  "));
        if !p.failing.is_empty() {
            let _ = writeln!(out, "  Below threshold: {}", p.failing.join(", "));
        }
    }
    out
}

pub fn groups(groups: &[CategoryGroup], theme: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(format!("Theme: {}", theme)).dim());
    for g in groups {
        let _ = writeln!(out, "\n{} ({})", style(&g.heading).bold(), g.members.len());
        for m in &g.members {
            let _ = writeln!(out, "  {:<40} {:>6}", m.identifier, format!("★ {}", m.stars));
        }
    }
    out
}

pub fn rule_sets(registry: &RuleSetRegistry) -> String {
    let mut out = String::new();
    for (name, rules) in registry.iter() {
        let _ = writeln!(out, "\n{} ({} rules)", style(name).bold(), rules.len());
        for r in rules {
            let _ = writeln!(
                out,
                "  {:<28} {:<13} w={:<4} {}",
                r.id,
                r.category.as_str(),
                r.weight,
                style(&r.description).dim()
            );
        }
    }
    out
}
