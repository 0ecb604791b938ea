//! Phase 6: cluster aggregation with the adaptive dispersion penalty.
//!
//! The cluster score is the weighted mean of its member areas, adjusted by
//! a penalty that rewards convergence and punishes divergence. The penalty
//! scales with the coefficient of variation and the classified dispersion
//! shape, and is capped so the adjusted score never drops below half the
//! weighted mean.

use crate::aggregation::invariants::{
    ViolationSeverity, Violation, check_coherence_bounds, check_convexity, check_hermeticity,
    check_score_bounds, check_weights, equal_weights, std_dev, weighted_mean,
};
use crate::core::ids::{Cluster, PolicyArea};
use crate::core::scores::{AreaScore, ClusterScore, DispersionShape, MAX_SCORE};
use crate::core::thresholds::ScoreThresholds;
use std::collections::BTreeSet;

/// Penalty floor: the adjusted score keeps at least half the mean.
pub const PENALTY_FLOOR: f64 = 0.5;

/// Shape classification over member scores.
///
/// Monotone in the coefficient of variation: `CV < 0.15` is uniform,
/// `CV < 0.40` clustered, `CV >= 0.40` dispersed — refined to bimodal when
/// the members form at least three distinct levels and the largest gap
/// between adjacent levels exceeds 60% of the range. The rule is recorded
/// in the run manifest.
#[must_use]
pub fn classify_shape(scores: &[f64], cv: f64) -> DispersionShape {
    if cv < 0.15 {
        return DispersionShape::Uniform;
    }
    if cv < 0.40 {
        return DispersionShape::Clustered;
    }

    let mut distinct: Vec<f64> = scores.to_vec();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    distinct.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    if distinct.len() >= 3 {
        let range = distinct[distinct.len() - 1] - distinct[0];
        let largest_gap = distinct
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(0.0_f64, f64::max);
        if range > 0.0 && largest_gap > 0.6 * range {
            return DispersionShape::Bimodal;
        }
    }
    DispersionShape::Dispersed
}

/// Sensitivity multiplier for the dispersion penalty.
#[must_use]
pub fn sensitivity_multiplier(cv: f64) -> f64 {
    if cv < 0.15 {
        0.5
    } else if cv < 0.40 {
        1.0
    } else if cv < 0.60 {
        1.5
    } else {
        2.0
    }
}

/// Aggregates one cluster's member areas.
#[must_use]
pub fn aggregate_cluster(
    cluster: Cluster,
    members: &[PolicyArea],
    areas: &[&AreaScore],
    thresholds: ScoreThresholds,
    violations: &mut Vec<Violation>,
) -> ClusterScore {
    let level = format!("cluster:{cluster}");

    // Hermeticity: exactly the declared member areas.
    let expected: BTreeSet<String> = members.iter().map(ToString::to_string).collect();
    let actual: Vec<String> = areas.iter().map(|a| a.policy_area.to_string()).collect();
    if let Some(v) = check_hermeticity(&expected, &actual, &level, ViolationSeverity::Critical) {
        violations.push(v);
    }

    let scores: Vec<f64> = areas.iter().map(|a| a.score).collect();
    let weights = equal_weights(scores.len());
    if let Some(v) = check_weights(&weights, &level) {
        violations.push(v);
    }

    let mean = weighted_mean(&scores, &weights);
    let deviation = std_dev(&scores);
    let cv = if mean > 0.0 { deviation / mean } else { 0.0 };

    let shape = classify_shape(&scores, cv);
    let base_penalty = deviation / MAX_SCORE;
    let penalty = base_penalty * sensitivity_multiplier(cv) * shape.factor();
    let penalty_factor = (1.0 - penalty).max(PENALTY_FLOOR);
    let score = mean * penalty_factor;

    if let Some(v) = check_convexity(&scores, score, &level) {
        violations.push(v);
    }
    if let Some(v) = check_score_bounds(score, &level) {
        violations.push(v);
    }

    let coherence = 1.0 - (deviation / MAX_SCORE).min(1.0);
    if let Some(v) = check_coherence_bounds(coherence, &level) {
        violations.push(v);
    }

    let mut contributing: Vec<PolicyArea> = areas.iter().map(|a| a.policy_area).collect();
    contributing.sort();

    ClusterScore {
        cluster,
        score,
        weighted_mean: mean,
        penalty_factor,
        coefficient_of_variation: cv,
        shape,
        coherence,
        quality_level: thresholds.classify(score / MAX_SCORE),
        contributing_areas: contributing,
    }
}
