//! Phase 4: dimension aggregation (5 micro scores per (PA, DIM) cell).

use crate::aggregation::bootstrap::bootstrap_interval;
use crate::aggregation::invariants::{
    ViolationSeverity, Violation, check_convexity, check_hermeticity, check_score_bounds,
    check_weights, equal_weights, weighted_mean,
};
use crate::core::ids::{Dimension, PolicyArea, QUESTIONS_PER_CELL, QuestionId};
use crate::core::scores::{DimensionScore, ScoredMicroQuestion};
use crate::core::thresholds::ScoreThresholds;
use std::collections::BTreeSet;

/// Aggregates the five micro scores of one grid cell.
///
/// Micro scores live on `[0, 1]`; the emitted score is rescaled to
/// `[0, 3]` with the quality label derived on the unit scale.
#[must_use]
pub fn aggregate_dimension(
    policy_area: PolicyArea,
    dimension: Dimension,
    micro: &[&ScoredMicroQuestion],
    thresholds: ScoreThresholds,
    bootstrap_seed: Option<u64>,
    violations: &mut Vec<Violation>,
) -> DimensionScore {
    let level = format!("dimension:{policy_area}-{dimension}");

    // Hermeticity: exactly the cell's five question ids.
    let expected: BTreeSet<String> = QuestionId::all()
        .filter(|q| q.policy_area() == policy_area && q.dimension() == dimension)
        .map(|q| q.to_string())
        .collect();
    debug_assert_eq!(expected.len(), QUESTIONS_PER_CELL);
    let actual: Vec<String> = micro.iter().map(|m| m.question_id.to_string()).collect();
    if let Some(v) =
        check_hermeticity(&expected, &actual, &level, ViolationSeverity::Critical)
    {
        violations.push(v);
    }

    let scores: Vec<f64> = micro.iter().map(|m| m.score).collect();
    let weights = equal_weights(scores.len());
    if let Some(v) = check_weights(&weights, &level) {
        violations.push(v);
    }

    let unit_mean = weighted_mean(&scores, &weights);
    if let Some(v) = check_convexity(&scores, unit_mean, &level) {
        violations.push(v);
    }

    let score = unit_mean * 3.0;
    if let Some(v) = check_score_bounds(score, &level) {
        violations.push(v);
    }

    let mut contributing: Vec<QuestionId> = micro.iter().map(|m| m.question_id).collect();
    contributing.sort();

    DimensionScore {
        policy_area,
        dimension,
        score,
        quality_level: thresholds.classify(unit_mean),
        contributing_questions: contributing,
        confidence_interval_95: bootstrap_seed.and_then(|seed| bootstrap_interval(&scores, seed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scores::ExecutionTrace;
    use crate::core::thresholds::QualityLevel;

    fn thresholds() -> ScoreThresholds {
        ScoreThresholds::new(0.85, 0.70, 0.55).unwrap()
    }

    fn micro(global: u16, score: f64) -> ScoredMicroQuestion {
        let question_id = QuestionId::new(global).unwrap();
        ScoredMicroQuestion {
            question_id,
            policy_area: question_id.policy_area(),
            dimension: question_id.dimension(),
            score,
            normalized_score: score * 3.0,
            quality_level: thresholds().classify(score),
            confidence_interval_95: None,
            evidence_digest: String::new(),
            trace: ExecutionTrace::default(),
        }
    }

    #[test]
    fn test_uniform_cell() {
        // Questions 1..=5 form cell (PA01, DIM01).
        let cell: Vec<ScoredMicroQuestion> = (1..=5).map(|g| micro(g, 0.9)).collect();
        let refs: Vec<&ScoredMicroQuestion> = cell.iter().collect();
        let mut violations = Vec::new();
        let result = aggregate_dimension(
            PolicyArea::Pa01,
            Dimension::Dim01,
            &refs,
            thresholds(),
            None,
            &mut violations,
        );
        assert!((result.score - 2.7).abs() < 1e-9);
        assert_eq!(result.quality_level, QualityLevel::Excelente);
        assert!(violations.is_empty());
        assert_eq!(result.contributing_questions.len(), 5);
    }

    #[test]
    fn test_mixed_cell_mean() {
        let scores = [0.2, 0.4, 0.6, 0.8, 1.0];
        let cell: Vec<ScoredMicroQuestion> = (1..=5)
            .zip(scores)
            .map(|(g, s)| micro(g, s))
            .collect();
        let refs: Vec<&ScoredMicroQuestion> = cell.iter().collect();
        let mut violations = Vec::new();
        let result = aggregate_dimension(
            PolicyArea::Pa01,
            Dimension::Dim01,
            &refs,
            thresholds(),
            Some(11),
            &mut violations,
        );
        assert!((result.score - 1.8).abs() < 1e-9);
        assert!(violations.is_empty());
        let interval = result.confidence_interval_95.unwrap();
        assert!(interval.lower <= result.score && result.score <= interval.upper);
    }

    #[test]
    fn test_hermeticity_gap_detected() {
        let cell: Vec<ScoredMicroQuestion> = (1..=4).map(|g| micro(g, 0.9)).collect();
        let refs: Vec<&ScoredMicroQuestion> = cell.iter().collect();
        let mut violations = Vec::new();
        aggregate_dimension(
            PolicyArea::Pa01,
            Dimension::Dim01,
            &refs,
            thresholds(),
            None,
            &mut violations,
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].invariant, "AGG-004");
        assert_eq!(violations[0].severity, ViolationSeverity::Critical);
    }

    #[test]
    fn test_foreign_question_detected() {
        let mut cell: Vec<ScoredMicroQuestion> = (1..=4).map(|g| micro(g, 0.9)).collect();
        // Question 6 belongs to (PA01, DIM02).
        cell.push(micro(6, 0.9));
        let refs: Vec<&ScoredMicroQuestion> = cell.iter().collect();
        let mut violations = Vec::new();
        aggregate_dimension(
            PolicyArea::Pa01,
            Dimension::Dim01,
            &refs,
            thresholds(),
            None,
            &mut violations,
        );
        assert!(violations.iter().any(|v| v.invariant == "AGG-004"));
    }
}
