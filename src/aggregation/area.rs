//! Phase 5: area aggregation (6 dimension scores per policy area).

use crate::aggregation::invariants::{
    ViolationSeverity, Violation, check_coherence_bounds, check_convexity, check_hermeticity,
    check_score_bounds, check_weights, equal_weights, std_dev, weighted_mean,
};
use crate::core::ids::{Dimension, PolicyArea};
use crate::core::scores::{AreaScore, DimensionScore, MAX_SCORE};
use crate::core::thresholds::ScoreThresholds;
use std::collections::BTreeSet;

/// Aggregates the six dimension scores of one policy area.
#[must_use]
pub fn aggregate_area(
    policy_area: PolicyArea,
    dimensions: &[&DimensionScore],
    thresholds: ScoreThresholds,
    violations: &mut Vec<Violation>,
) -> AreaScore {
    let level = format!("area:{policy_area}");

    // Hermeticity: all six dimensions, once each.
    let expected: BTreeSet<String> = Dimension::ALL.iter().map(ToString::to_string).collect();
    let actual: Vec<String> = dimensions.iter().map(|d| d.dimension.to_string()).collect();
    if let Some(v) = check_hermeticity(&expected, &actual, &level, ViolationSeverity::Critical) {
        violations.push(v);
    }

    let scores: Vec<f64> = dimensions.iter().map(|d| d.score).collect();
    let weights = equal_weights(scores.len());
    if let Some(v) = check_weights(&weights, &level) {
        violations.push(v);
    }

    let score = weighted_mean(&scores, &weights);
    if let Some(v) = check_convexity(&scores, score, &level) {
        violations.push(v);
    }
    if let Some(v) = check_score_bounds(score, &level) {
        violations.push(v);
    }

    let coherence = 1.0 - (std_dev(&scores) / MAX_SCORE).min(1.0);
    if let Some(v) = check_coherence_bounds(coherence, &level) {
        violations.push(v);
    }

    let mut contributing: Vec<Dimension> = dimensions.iter().map(|d| d.dimension).collect();
    contributing.sort();

    AreaScore {
        policy_area,
        score,
        quality_level: thresholds.classify(score / MAX_SCORE),
        contributing_dimensions: contributing,
        coherence,
    }
}
