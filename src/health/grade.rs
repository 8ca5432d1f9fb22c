//! Score-to-grade thresholds

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// One grade and the minimum score that earns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeThreshold {
    pub grade: String,
    pub min_score: f64,
}

/// Grade thresholds in strictly descending order, ending at 0
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GradeThresholds(Vec<GradeThreshold>);

impl GradeThresholds {
    /// Validate that the thresholds are totally ordered and cover [0, 100]
    pub fn new(thresholds: Vec<GradeThreshold>) -> EngineResult<Self> {
        let last = thresholds
            .last()
            .ok_or_else(|| EngineError::InvalidThresholds("no thresholds given".to_string()))?;
        if last.min_score != 0.0 {
            return Err(EngineError::InvalidThresholds(format!(
                "lowest grade '{}' must start at 0, not {}",
                last.grade, last.min_score
            )));
        }

        let mut names = std::collections::HashSet::new();
        for t in &thresholds {
            if t.grade.trim().is_empty() {
                return Err(EngineError::InvalidThresholds("empty grade name".to_string()));
            }
            if !names.insert(t.grade.as_str()) {
                return Err(EngineError::InvalidThresholds(format!(
                    "grade '{}' listed twice",
                    t.grade
                )));
            }
            if !t.min_score.is_finite() || !(0.0..=100.0).contains(&t.min_score) {
                return Err(EngineError::InvalidThresholds(format!(
                    "grade '{}' threshold {} is outside [0, 100]",
                    t.grade, t.min_score
                )));
            }
        }

        for pair in thresholds.windows(2) {
            if pair[0].min_score <= pair[1].min_score {
                return Err(EngineError::InvalidThresholds(format!(
                    "'{}' ({}) must be above '{}' ({})",
                    pair[0].grade, pair[0].min_score, pair[1].grade, pair[1].min_score
                )));
            }
        }

        Ok(Self(thresholds))
    }

    /// Grade of the first threshold the score meets or exceeds
    pub fn grade_for(&self, score: f64) -> &str {
        self.0
            .iter()
            .find(|t| score >= t.min_score)
            .or(self.0.last())
            .map(|t| t.grade.as_str())
            .unwrap_or("F")
    }

    pub fn thresholds(&self) -> &[GradeThreshold] {
        &self.0
    }

    /// Grade names, best first
    pub fn grades(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|t| t.grade.as_str())
    }
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self(
            [("A", 90.0), ("B", 75.0), ("C", 60.0), ("D", 40.0), ("F", 0.0)]
                .into_iter()
                .map(|(grade, min_score)| GradeThreshold {
                    grade: grade.to_string(),
                    min_score,
                })
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for GradeThresholds {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let thresholds = Vec::<GradeThreshold>::deserialize(deserializer)?;
        GradeThresholds::new(thresholds).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(grade: &str, min_score: f64) -> GradeThreshold {
        GradeThreshold {
            grade: grade.into(),
            min_score,
        }
    }

    #[test]
    fn test_default_grades() {
        let g = GradeThresholds::default();
        assert_eq!(g.grade_for(100.0), "A");
        assert_eq!(g.grade_for(90.0), "A");
        assert_eq!(g.grade_for(89.99), "B");
        assert_eq!(g.grade_for(75.0), "B");
        assert_eq!(g.grade_for(60.0), "C");
        assert_eq!(g.grade_for(40.0), "D");
        assert_eq!(g.grade_for(39.9), "F");
        assert_eq!(g.grade_for(0.0), "F");
    }

    #[test]
    fn test_default_is_valid() {
        let g = GradeThresholds::default();
        assert_eq!(GradeThresholds::new(g.thresholds().to_vec()).unwrap(), g);
    }

    #[test]
    fn test_rejects_unordered() {
        let err = GradeThresholds::new(vec![t("A", 50.0), t("B", 70.0), t("F", 0.0)]);
        assert!(matches!(err, Err(EngineError::InvalidThresholds(_))));
    }

    #[test]
    fn test_rejects_gap_at_zero() {
        assert!(GradeThresholds::new(vec![t("Pass", 50.0), t("Low", 10.0)]).is_err());
        assert!(GradeThresholds::new(vec![]).is_err());
    }

    #[test]
    fn test_rejects_duplicates_and_range() {
        assert!(GradeThresholds::new(vec![t("A", 90.0), t("A", 0.0)]).is_err());
        assert!(GradeThresholds::new(vec![t("A", 120.0), t("F", 0.0)]).is_err());
    }

    #[test]
    fn test_custom_two_grades() {
        let g = GradeThresholds::new(vec![t("Pass", 70.0), t("Fail", 0.0)]).unwrap();
        assert_eq!(g.grade_for(70.0), "Pass");
        assert_eq!(g.grade_for(69.0), "Fail");
        assert_eq!(g.grades().collect::<Vec<_>>(), vec!["Pass", "Fail"]);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GradeThresholds =
            serde_json::from_str(r#"[{"grade": "A", "min_score": 80}, {"grade": "F", "min_score": 0}]"#)
                .unwrap();
        assert_eq!(ok.grade_for(85.0), "A");
        assert!(serde_json::from_str::<GradeThresholds>(r#"[{"grade": "A", "min_score": 80}]"#).is_err());
    }
}
