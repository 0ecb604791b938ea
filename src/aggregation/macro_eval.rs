//! Phase 7: macro evaluation and the strategic metrics.

use crate::aggregation::invariants::{
    ViolationSeverity, Violation, check_coherence_bounds, check_convexity, check_hermeticity,
    check_score_bounds, check_weights, equal_weights, std_dev, weighted_mean,
};
use crate::core::ids::Cluster;
use crate::core::scores::{
    AreaScore, ClusterScore, DimensionRank, DimensionScore, MAX_SCORE, MacroScore,
    StrategicMetrics, SystemicGap,
};
use crate::core::thresholds::ScoreThresholds;
use std::collections::BTreeSet;

/// Maximum possible variance of scores on `[0, MAX_SCORE]`.
const MAX_VARIANCE: f64 = (MAX_SCORE / 2.0) * (MAX_SCORE / 2.0);

/// Computes the strategic metrics over the full PA x DIM matrix.
#[must_use]
pub fn strategic_metrics(
    dimension_scores: &[DimensionScore],
    area_scores: &[AreaScore],
    cluster_scores: &[ClusterScore],
    thresholds: ScoreThresholds,
) -> StrategicMetrics {
    // Coverage and systemic gaps over the 60 cells, on the unit scale.
    let mut covered = 0usize;
    let mut gaps = Vec::new();
    for cell in dimension_scores {
        let unit = cell.score / MAX_SCORE;
        if unit >= thresholds.aceptable {
            covered += 1;
        } else {
            gaps.push(SystemicGap {
                policy_area: cell.policy_area,
                dimension: cell.dimension,
            });
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let coverage_rate = if dimension_scores.is_empty() {
        0.0
    } else {
        covered as f64 / dimension_scores.len() as f64
    };

    // Dimension ranking by mean score across policy areas, best first.
    let mut ranking: Vec<DimensionRank> = crate::core::ids::Dimension::ALL
        .iter()
        .map(|dim| {
            let scores: Vec<f64> = dimension_scores
                .iter()
                .filter(|d| d.dimension == *dim)
                .map(|d| d.score)
                .collect();
            #[allow(clippy::cast_precision_loss)]
            let mean_score = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            DimensionRank {
                dimension: *dim,
                mean_score,
            }
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.mean_score
            .partial_cmp(&a.mean_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.dimension.cmp(&b.dimension))
    });

    // Balance: one minus the normalized variance across policy areas.
    let area_values: Vec<f64> = area_scores.iter().map(|a| a.score).collect();
    let variance = std_dev(&area_values).powi(2);
    let balance_score = 1.0 - (variance / MAX_VARIANCE).min(1.0);

    #[allow(clippy::cast_precision_loss)]
    let cluster_coherence = if cluster_scores.is_empty() {
        0.0
    } else {
        cluster_scores.iter().map(|c| c.coherence).sum::<f64>() / cluster_scores.len() as f64
    };

    StrategicMetrics {
        coverage_rate,
        dimension_ranking: ranking,
        balance_score,
        cluster_coherence,
        systemic_gaps: gaps,
    }
}

/// Aggregates the four cluster scores into the macro score.
///
/// No post-hoc clamp is applied; a score outside `[0, 3]` is surfaced as
/// an AGG-002 violation with the score unchanged.
#[must_use]
pub fn aggregate_macro(
    clusters: &[&ClusterScore],
    strategic: StrategicMetrics,
    thresholds: ScoreThresholds,
    violations: &mut Vec<Violation>,
) -> MacroScore {
    let level = "macro";

    let expected: BTreeSet<String> = Cluster::ALL.iter().map(ToString::to_string).collect();
    let actual: Vec<String> = clusters.iter().map(|c| c.cluster.to_string()).collect();
    if let Some(v) = check_hermeticity(&expected, &actual, level, ViolationSeverity::Critical) {
        violations.push(v);
    }

    let scores: Vec<f64> = clusters.iter().map(|c| c.score).collect();
    let weights = equal_weights(scores.len());
    if let Some(v) = check_weights(&weights, level) {
        violations.push(v);
    }

    let score = weighted_mean(&scores, &weights);
    if let Some(v) = check_convexity(&scores, score, level) {
        violations.push(v);
    }
    if let Some(v) = check_score_bounds(score, level) {
        violations.push(v);
    }

    #[allow(clippy::cast_precision_loss)]
    let coherence = if clusters.is_empty() {
        0.0
    } else {
        clusters.iter().map(|c| c.coherence).sum::<f64>() / clusters.len() as f64
    };
    if let Some(v) = check_coherence_bounds(coherence, level) {
        violations.push(v);
    }

    let mut contributing: Vec<Cluster> = clusters.iter().map(|c| c.cluster).collect();
    contributing.sort();

    MacroScore {
        score,
        quality_level: thresholds.classify(score / MAX_SCORE),
        coherence,
        contributing_clusters: contributing,
        strategic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{Dimension, PolicyArea};
    use crate::core::scores::DispersionShape;
    use crate::core::thresholds::QualityLevel;

    fn thresholds() -> ScoreThresholds {
        ScoreThresholds::new(0.85, 0.70, 0.55).unwrap()
    }

    fn cluster(id: Cluster, score: f64, coherence: f64) -> ClusterScore {
        ClusterScore {
            cluster: id,
            score,
            weighted_mean: score,
            penalty_factor: 1.0,
            coefficient_of_variation: 0.0,
            shape: DispersionShape::Uniform,
            coherence,
            quality_level: thresholds().classify(score / MAX_SCORE),
            contributing_areas: vec![],
        }
    }

    fn empty_strategic() -> StrategicMetrics {
        strategic_metrics(&[], &[], &[], thresholds())
    }

    #[test]
    fn test_uniform_macro() {
        let clusters: Vec<ClusterScore> = Cluster::ALL
            .iter()
            .map(|c| cluster(*c, 2.7, 1.0))
            .collect();
        let refs: Vec<&ClusterScore> = clusters.iter().collect();
        let mut violations = Vec::new();
        let result = aggregate_macro(&refs, empty_strategic(), thresholds(), &mut violations);
        assert!((result.score - 2.7).abs() < 1e-9);
        assert_eq!(result.quality_level, QualityLevel::Excelente);
        assert!((result.coherence - 1.0).abs() < 1e-9);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_missing_cluster_detected() {
        let clusters: Vec<ClusterScore> = Cluster::ALL[..3]
            .iter()
            .map(|c| cluster(*c, 2.0, 1.0))
            .collect();
        let refs: Vec<&ClusterScore> = clusters.iter().collect();
        let mut violations = Vec::new();
        aggregate_macro(&refs, empty_strategic(), thresholds(), &mut violations);
        assert!(violations.iter().any(|v| v.invariant == "AGG-004"));
    }

    fn dimension_grid(score_of: impl Fn(PolicyArea, Dimension) -> f64) -> Vec<DimensionScore> {
        let mut grid = Vec::new();
        for pa in PolicyArea::ALL {
            for dim in Dimension::ALL {
                let score = score_of(pa, dim);
                grid.push(DimensionScore {
                    policy_area: pa,
                    dimension: dim,
                    score,
                    quality_level: thresholds().classify(score / MAX_SCORE),
                    contributing_questions: vec![],
                    confidence_interval_95: None,
                });
            }
        }
        grid
    }

    #[test]
    fn test_systemic_gaps_and_coverage() {
        // PA01 fails everywhere; the rest sit comfortably above the bar.
        let grid = dimension_grid(|pa, _| if pa == PolicyArea::Pa01 { 0.3 } else { 2.4 });
        let metrics = strategic_metrics(&grid, &[], &[], thresholds());
        assert_eq!(metrics.systemic_gaps.len(), 6);
        assert!(
            metrics
                .systemic_gaps
                .iter()
                .all(|g| g.policy_area == PolicyArea::Pa01)
        );
        assert!((metrics.coverage_rate - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_no_gaps_in_uniform_grid() {
        let grid = dimension_grid(|_, _| 2.7);
        let metrics = strategic_metrics(&grid, &[], &[], thresholds());
        assert!(metrics.systemic_gaps.is_empty());
        assert!((metrics.coverage_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_ranking_sorted() {
        let grid = dimension_grid(|_, dim| match dim {
            Dimension::Dim03 => 2.9,
            Dimension::Dim01 => 2.0,
            _ => 1.0,
        });
        let metrics = strategic_metrics(&grid, &[], &[], thresholds());
        assert_eq!(metrics.dimension_ranking[0].dimension, Dimension::Dim03);
        assert_eq!(metrics.dimension_ranking[1].dimension, Dimension::Dim01);
        assert!((metrics.dimension_ranking[0].mean_score - 2.9).abs() < 1e-9);
    }

    #[test]
    fn test_balance_score() {
        let uniform_areas: Vec<AreaScore> = PolicyArea::ALL
            .iter()
            .map(|pa| AreaScore {
                policy_area: *pa,
                score: 2.0,
                quality_level: QualityLevel::Bueno,
                contributing_dimensions: vec![],
                coherence: 1.0,
            })
            .collect();
        let metrics = strategic_metrics(&[], &uniform_areas, &[], thresholds());
        assert!((metrics.balance_score - 1.0).abs() < 1e-9);
    }
}
