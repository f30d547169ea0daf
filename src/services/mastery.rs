//! Per-skill mastery derivation from quiz history.
//!
//! Mastery is a recency-weighted average of quiz scores inside a 30-day
//! window: a result loses half its weight every 14 days, so recent evidence
//! dominates without older results vanishing outright.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};

const LOOKBACK_DAYS: i64 = 30;
const HALF_LIFE_DAYS: f64 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SkillMastery {
    pub skill_id: String,
    pub mastery_level: f64,
}

pub async fn compute_skill_mastery(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<SkillMastery>, sqlx::Error> {
    let now = Utc::now();
    let since = now - Duration::days(LOOKBACK_DAYS);

    let rows = sqlx::query(
        r#"
        SELECT "skillId", "score", "completedAt"
        FROM "quiz_results"
        WHERE "studentId" = $1 AND "completedAt" >= $2
        ORDER BY "completedAt" DESC
        "#,
    )
    .bind(student_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    let mut samples: HashMap<String, Vec<(f64, f64)>> = HashMap::new();
    for row in rows {
        let skill_id: Option<String> = row.try_get("skillId").ok();
        let completed_at: Option<DateTime<Utc>> = row.try_get("completedAt").ok();
        if let (Some(skill_id), Some(completed_at)) = (skill_id, completed_at) {
            let score: f64 = row.try_get("score").unwrap_or(0.0);
            let age_days = (now - completed_at).num_seconds() as f64 / 86_400.0;
            samples.entry(skill_id).or_default().push((score, age_days));
        }
    }

    let mut result: Vec<SkillMastery> = samples
        .into_iter()
        .map(|(skill_id, samples)| SkillMastery {
            skill_id,
            mastery_level: weighted_mastery(&samples),
        })
        .collect();
    result.sort_by(|a, b| a.skill_id.cmp(&b.skill_id));

    Ok(result)
}

/// Weighted average of (score, age_days) samples, clamped to 0..=100.
pub fn weighted_mastery(samples: &[(f64, f64)]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut weight_sum = 0.0;
    let mut weighted = 0.0;
    for &(score, age_days) in samples {
        let w = 0.5_f64.powf(age_days.max(0.0) / HALF_LIFE_DAYS);
        weight_sum += w;
        weighted += w * score;
    }

    if weight_sum <= 0.0 {
        return 0.0;
    }

    (weighted / weight_sum).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::weighted_mastery;

    #[test]
    fn empty_history_yields_zero() {
        assert_eq!(weighted_mastery(&[]), 0.0);
    }

    #[test]
    fn single_sample_is_its_own_score() {
        let mastery = weighted_mastery(&[(82.0, 3.0)]);
        assert!((mastery - 82.0).abs() < 1e-9);
    }

    #[test]
    fn recent_scores_dominate_old_ones() {
        // 90 today vs 30 four weeks ago: result should sit well above the
        // plain average of 60.
        let mastery = weighted_mastery(&[(90.0, 0.0), (30.0, 28.0)]);
        assert!(mastery > 70.0, "mastery = {mastery}");
        assert!(mastery < 90.0);
    }

    #[test]
    fn stays_in_declared_range() {
        let mastery = weighted_mastery(&[(250.0, 0.0), (-40.0, 1.0)]);
        assert!((0.0..=100.0).contains(&mastery));
    }
}
