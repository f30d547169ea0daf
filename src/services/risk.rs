//! Rule-based student risk classification.

use serde::{Deserialize, Serialize};

pub const INACTIVITY_SENTINEL_DAYS: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: f64,
    pub top_factors: serde_json::Value,
    pub recommended_actions: serde_json::Value,
}

/// Ordered policy, first match wins:
/// high when performance is low with enough evidence, or the student has been
/// inactive for over a week; medium on middling averages, thin evidence, or
/// shorter inactivity; low otherwise.
pub fn classify(avg_score: f64, quiz_count: usize, inactivity_days: f64) -> RiskLevel {
    if (avg_score < 60.0 && quiz_count >= 5) || inactivity_days > 7.0 {
        return RiskLevel::High;
    }

    if (60.0..75.0).contains(&avg_score) || quiz_count < 3 || inactivity_days > 3.0 {
        return RiskLevel::Medium;
    }

    RiskLevel::Low
}

/// Higher score means higher risk, one decimal place.
pub fn risk_score(avg_score: f64) -> f64 {
    ((100.0 - avg_score) * 10.0).round() / 10.0
}

pub fn assess(avg_score: f64, quiz_count: usize, inactivity_days: f64) -> RiskAssessment {
    let level = classify(avg_score, quiz_count, inactivity_days);

    let top_factors = serde_json::json!({
        "inactivity_days": inactivity_days.round(),
        "quiz_count": quiz_count,
    });

    let recommended_actions = match level {
        RiskLevel::High => serde_json::json!({
            "assign_remedial": true,
            "notify_parent": true,
        }),
        _ => serde_json::json!({ "practice_more": true }),
    };

    RiskAssessment {
        level,
        score: risk_score(avg_score),
        top_factors,
        recommended_actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn low_average_with_enough_quizzes_is_high() {
        assert_eq!(classify(50.0, 6, 1.0), RiskLevel::High);
    }

    #[test]
    fn middling_average_is_medium() {
        assert_eq!(classify(70.0, 6, 1.0), RiskLevel::Medium);
    }

    #[test]
    fn healthy_student_is_low() {
        assert_eq!(classify(90.0, 6, 1.0), RiskLevel::Low);
    }

    #[test]
    fn thin_evidence_overrides_high_average() {
        assert_eq!(classify(90.0, 1, 1.0), RiskLevel::Medium);
    }

    #[test]
    fn week_of_inactivity_is_high_regardless_of_average() {
        assert_eq!(classify(95.0, 10, 8.0), RiskLevel::High);
    }

    #[test]
    fn short_inactivity_is_medium() {
        assert_eq!(classify(90.0, 6, 4.0), RiskLevel::Medium);
    }

    #[test]
    fn no_records_sentinel_is_high() {
        assert_eq!(classify(0.0, 0, INACTIVITY_SENTINEL_DAYS), RiskLevel::High);
    }

    #[test]
    fn score_is_inverted_average_with_one_decimal() {
        assert!((risk_score(62.34) - 37.7).abs() < 1e-9);
        assert_eq!(risk_score(100.0), 0.0);
        assert_eq!(risk_score(0.0), 100.0);
    }

    #[test]
    fn high_risk_actions_include_parent_notification() {
        let assessment = assess(40.0, 8, 1.0);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.recommended_actions["notify_parent"], true);
        assert_eq!(assessment.recommended_actions["assign_remedial"], true);
    }

    #[test]
    fn stored_factors_use_snake_case_keys() {
        let assessment = assess(40.0, 8, 2.6);
        assert_eq!(assessment.top_factors["inactivity_days"], 3.0);
        assert_eq!(assessment.top_factors["quiz_count"], 8);
        assert!(assessment.top_factors.get("inactivityDays").is_none());
    }

    #[test]
    fn non_high_risk_actions_suggest_practice() {
        let assessment = assess(90.0, 6, 1.0);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.recommended_actions["practice_more"], true);
    }

    proptest! {
        #[test]
        fn score_stays_in_range_for_valid_averages(avg in 0.0f64..=100.0) {
            let score = risk_score(avg);
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn classification_is_total(
            avg in 0.0f64..=100.0,
            quizzes in 0usize..50,
            inactivity in 0.0f64..=999.0,
        ) {
            // Every input lands on exactly one of the three levels.
            let level = classify(avg, quizzes, inactivity);
            prop_assert!(matches!(level, RiskLevel::Low | RiskLevel::Medium | RiskLevel::High));
        }
    }
}
