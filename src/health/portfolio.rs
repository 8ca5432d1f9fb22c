//! Portfolio-wide health summary

use super::grade::GradeThresholds;
use super::report::HealthReport;
use serde::{Deserialize, Serialize};

/// Count of repositories that earned one grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

/// Aggregate over many health reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHealth {
    pub total: usize,
    /// Repositories scoring at least `min_score`
    pub passed: usize,
    pub failed: usize,
    pub min_score: f64,
    pub average_score: f64,
    /// In threshold order, best grade first; grades nobody earned are included
    pub grade_distribution: Vec<GradeCount>,
    /// Identifiers scoring below `min_score`, in report order
    pub failing: Vec<String>,
}

impl PortfolioHealth {
    pub fn from_reports(reports: &[HealthReport], min_score: f64, grades: &GradeThresholds) -> Self {
        let total = reports.len();
        let failing: Vec<String> = reports
            .iter()
            .filter(|r| r.score < min_score)
            .map(|r| r.identifier.clone())
            .collect();
        let average_score = if total == 0 {
            0.0
        } else {
            reports.iter().map(|r| r.score).sum::<f64>() / total as f64
        };

        let mut grade_distribution: Vec<GradeCount> = grades
            .grades()
            .map(|g| GradeCount {
                grade: g.to_string(),
                count: 0,
            })
            .collect();
        for report in reports {
            match grade_distribution.iter_mut().find(|g| g.grade == report.grade) {
                Some(entry) => entry.count += 1,
                // Report graded under different thresholds
                None => grade_distribution.push(GradeCount {
                    grade: report.grade.clone(),
                    count: 1,
                }),
            }
        }

        Self {
            total,
            passed: total - failing.len(),
            failed: failing.len(),
            min_score,
            average_score,
            grade_distribution,
            failing,
        }
    }

    /// Share of repositories with `grade`, in percent
    pub fn grade_share(&self, grade: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let count = self
            .grade_distribution
            .iter()
            .find(|g| g.grade == grade)
            .map_or(0, |g| g.count);
        100.0 * count as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthSummary;

    fn report(id: &str, score: f64, grade: &str) -> HealthReport {
        HealthReport {
            identifier: id.into(),
            rule_set: "general".into(),
            results: vec![],
            score,
            grade: grade.into(),
            summary: HealthSummary::default(),
        }
    }

    #[test]
    fn test_portfolio_summary() {
        let reports = vec![
            report("a/one", 95.0, "A"),
            report("a/two", 65.0, "C"),
            report("a/three", 30.0, "F"),
            report("a/four", 92.0, "A"),
        ];
        let p = PortfolioHealth::from_reports(&reports, 70.0, &GradeThresholds::default());
        assert_eq!(p.total, 4);
        assert_eq!(p.passed, 2);
        assert_eq!(p.failed, 2);
        assert_eq!(p.failing, vec!["a/two", "a/three"]);
        assert_eq!(p.average_score, 70.5);
        let grades: Vec<(&str, usize)> = p
            .grade_distribution
            .iter()
            .map(|g| (g.grade.as_str(), g.count))
            .collect();
        assert_eq!(grades, vec![("A", 2), ("B", 0), ("C", 1), ("D", 0), ("F", 1)]);
        assert_eq!(p.grade_share("A"), 50.0);
    }

    #[test]
    fn test_empty_portfolio() {
        let p = PortfolioHealth::from_reports(&[], 70.0, &GradeThresholds::default());
        assert_eq!(p.total, 0);
        assert_eq!(p.average_score, 0.0);
        assert_eq!(p.grade_share("A"), 0.0);
    }
}
