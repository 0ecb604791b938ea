//! Four-level aggregation (C10): micro -> dimension -> area -> cluster ->
//! macro, under the AGG invariants.
//!
//! [`aggregate_all`] is the phase 4–7 fold the driver calls; each level is
//! also independently usable. Aggregation is order-independent: inputs are
//! grouped and sorted by their coordinates before folding.

pub mod area;
pub mod bootstrap;
pub mod cluster;
pub mod dimension;
pub mod invariants;
pub mod macro_eval;

pub use area::aggregate_area;
pub use bootstrap::bootstrap_interval;
pub use cluster::{PENALTY_FLOOR, aggregate_cluster, classify_shape, sensitivity_multiplier};
pub use dimension::aggregate_dimension;
pub use invariants::{ViolationSeverity, Violation, WEIGHT_TOLERANCE};
pub use macro_eval::{aggregate_macro, strategic_metrics};

use crate::core::ids::{Cluster, Dimension, PolicyArea};
use crate::core::scores::{
    AreaScore, ClusterScore, DimensionScore, MacroScore, ScoredMicroQuestion,
};
use crate::error::{AggregationError, Result};
use crate::questionnaire::Questionnaire;
use tracing::{info, warn};

/// Everything phases 4–7 produce.
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    /// The 60 dimension scores in (PA, DIM) order.
    pub dimension_scores: Vec<DimensionScore>,

    /// The 10 area scores in policy-area order.
    pub area_scores: Vec<AreaScore>,

    /// The 4 cluster scores in cluster order.
    pub cluster_scores: Vec<ClusterScore>,

    /// The macro score.
    pub macro_score: MacroScore,

    /// Non-critical violations, surfaced as warnings in the manifest.
    pub violations: Vec<Violation>,
}

fn first_critical(violations: &[Violation]) -> Option<&Violation> {
    violations
        .iter()
        .find(|v| v.severity == ViolationSeverity::Critical)
}

fn critical_to_error(violation: &Violation) -> AggregationError {
    if violation.invariant == "AGG-001" {
        AggregationError::WeightNormalization {
            invariant: violation.invariant.clone(),
            level: violation.level.clone(),
            sum: f64::NAN,
        }
    } else {
        AggregationError::Hermeticity {
            invariant: violation.invariant.clone(),
            level: violation.level.clone(),
            reason: violation.message.clone(),
        }
    }
}

/// Folds the 300 micro scores through all four levels.
///
/// # Errors
///
/// Returns an [`AggregationError`] on a CRITICAL invariant violation, an
/// empty level with non-empty inputs, or a zero macro score over non-zero
/// inputs.
pub fn aggregate_all(
    micro: &[ScoredMicroQuestion],
    questionnaire: &Questionnaire,
    bootstrap_seed: Option<u64>,
) -> Result<AggregationOutcome> {
    let thresholds = questionnaire.thresholds();
    let mut violations: Vec<Violation> = Vec::new();

    if micro.is_empty() {
        return Err(AggregationError::EmptyResult {
            level: "dimension".to_string(),
            inputs: 0,
        }
        .into());
    }

    // Phase 4: dimension aggregation over the 60 cells.
    let mut dimension_scores = Vec::with_capacity(60);
    for pa in PolicyArea::ALL {
        for dim in Dimension::ALL {
            let cell: Vec<&ScoredMicroQuestion> = micro
                .iter()
                .filter(|m| m.policy_area == pa && m.dimension == dim)
                .collect();
            let seed = bootstrap_seed
                .map(|s| s.wrapping_add(u64::from(pa.index() as u32) * 100 + dim.index() as u64));
            dimension_scores.push(aggregate_dimension(
                pa,
                dim,
                &cell,
                thresholds,
                seed,
                &mut violations,
            ));
        }
    }
    if let Some(critical) = first_critical(&violations) {
        return Err(critical_to_error(critical).into());
    }

    // Phase 5: area aggregation.
    let mut area_scores = Vec::with_capacity(10);
    for pa in PolicyArea::ALL {
        let dims: Vec<&DimensionScore> = dimension_scores
            .iter()
            .filter(|d| d.policy_area == pa)
            .collect();
        if dims.is_empty() {
            return Err(AggregationError::EmptyResult {
                level: format!("area:{pa}"),
                inputs: dimension_scores.len(),
            }
            .into());
        }
        area_scores.push(aggregate_area(pa, &dims, thresholds, &mut violations));
    }
    if let Some(critical) = first_critical(&violations) {
        return Err(critical_to_error(critical).into());
    }

    // Phase 6: cluster aggregation per the questionnaire's membership map.
    let mut cluster_scores = Vec::with_capacity(4);
    for c in Cluster::ALL {
        let members = questionnaire
            .clusters()
            .get(&c)
            .cloned()
            .unwrap_or_default();
        let areas: Vec<&AreaScore> = area_scores
            .iter()
            .filter(|a| members.contains(&a.policy_area))
            .collect();
        if areas.is_empty() {
            return Err(AggregationError::EmptyResult {
                level: format!("cluster:{c}"),
                inputs: area_scores.len(),
            }
            .into());
        }
        cluster_scores.push(aggregate_cluster(
            c,
            &members,
            &areas,
            thresholds,
            &mut violations,
        ));
    }
    if let Some(critical) = first_critical(&violations) {
        return Err(critical_to_error(critical).into());
    }

    // Phase 7: macro evaluation.
    let strategic = strategic_metrics(&dimension_scores, &area_scores, &cluster_scores, thresholds);
    let cluster_refs: Vec<&ClusterScore> = cluster_scores.iter().collect();
    let macro_score = aggregate_macro(&cluster_refs, strategic, thresholds, &mut violations);
    if let Some(critical) = first_critical(&violations) {
        return Err(critical_to_error(critical).into());
    }

    // Orchestrator-level validation hook: a zero macro over non-zero
    // inputs is a hard failure.
    let inputs_nonzero = micro.iter().any(|m| m.score > 0.0);
    if inputs_nonzero && macro_score.score <= 0.0 {
        return Err(AggregationError::ZeroMacro.into());
    }

    for violation in &violations {
        warn!(
            invariant = %violation.invariant,
            level = %violation.level,
            message = %violation.message,
            "aggregation violation"
        );
    }
    info!(
        macro_score = macro_score.score,
        quality = %macro_score.quality_level,
        "aggregation complete"
    );

    Ok(AggregationOutcome {
        dimension_scores,
        area_scores,
        cluster_scores,
        macro_score,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::QuestionId;
    use crate::core::scores::ExecutionTrace;
    use crate::core::thresholds::{QualityLevel, ScoreThresholds};
    use crate::questionnaire::{Questionnaire, default_clusters, layout_questions};

    fn questionnaire() -> Questionnaire {
        Questionnaire::new(
            layout_questions(),
            ScoreThresholds::new(0.85, 0.70, 0.55).unwrap(),
            default_clusters(),
            vec![],
        )
        .unwrap()
    }

    fn micro_with(score_of: impl Fn(QuestionId) -> f64) -> Vec<ScoredMicroQuestion> {
        QuestionId::all()
            .map(|question_id| {
                let score = score_of(question_id);
                ScoredMicroQuestion {
                    question_id,
                    policy_area: question_id.policy_area(),
                    dimension: question_id.dimension(),
                    score,
                    normalized_score: score * 3.0,
                    quality_level: ScoreThresholds::new(0.85, 0.70, 0.55)
                        .unwrap()
                        .classify(score),
                    confidence_interval_95: None,
                    evidence_digest: String::new(),
                    trace: ExecutionTrace::default(),
                }
            })
            .collect()
    }

    #[test]
    fn test_uniform_perfect_plan() {
        // All 300 micro scores at 0.90.
        let outcome = aggregate_all(&micro_with(|_| 0.90), &questionnaire(), None).unwrap();
        assert_eq!(outcome.dimension_scores.len(), 60);
        assert_eq!(outcome.area_scores.len(), 10);
        assert_eq!(outcome.cluster_scores.len(), 4);
        for d in &outcome.dimension_scores {
            assert!((d.score - 2.7).abs() < 1e-9);
            assert_eq!(d.quality_level, QualityLevel::Excelente);
        }
        for a in &outcome.area_scores {
            assert!((a.score - 2.7).abs() < 1e-9);
        }
        for c in &outcome.cluster_scores {
            assert!((c.score - 2.7).abs() < 1e-9);
            assert!((c.coherence - 1.0).abs() < 1e-9);
        }
        assert!((outcome.macro_score.score - 2.7).abs() < 1e-9);
        assert_eq!(outcome.macro_score.quality_level, QualityLevel::Excelente);
        assert!(outcome.macro_score.strategic.systemic_gaps.is_empty());
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_threshold_boundary_plan() {
        // All 300 micro scores at 0.70: BUENO at every level.
        let outcome = aggregate_all(&micro_with(|_| 0.70), &questionnaire(), None).unwrap();
        for d in &outcome.dimension_scores {
            assert!((d.score - 2.1).abs() < 1e-9);
            assert_eq!(d.quality_level, QualityLevel::Bueno);
        }
        assert!((outcome.macro_score.score - 2.1).abs() < 1e-9);
        assert_eq!(outcome.macro_score.quality_level, QualityLevel::Bueno);
    }

    #[test]
    fn test_critical_fail_one_area() {
        // PA01 collapses to 0.10, everything else at 0.80.
        let outcome = aggregate_all(
            &micro_with(|q| {
                if q.policy_area() == PolicyArea::Pa01 {
                    0.10
                } else {
                    0.80
                }
            }),
            &questionnaire(),
            None,
        )
        .unwrap();

        let pa01 = &outcome.area_scores[0];
        assert!((pa01.score - 0.30).abs() < 1e-9);
        for a in &outcome.area_scores[1..] {
            assert!((a.score - 2.40).abs() < 1e-9);
        }

        // The cluster containing PA01 is penalized for dispersion.
        let c1 = &outcome.cluster_scores[0];
        assert!(c1.coefficient_of_variation > 0.4);
        assert!(c1.penalty_factor < 1.0);
        assert!(c1.score < c1.weighted_mean);

        assert!(outcome.macro_score.score >= 1.7 && outcome.macro_score.score <= 2.0);

        let gaps = &outcome.macro_score.strategic.systemic_gaps;
        assert_eq!(gaps.len(), 6);
        assert!(gaps.iter().all(|g| g.policy_area == PolicyArea::Pa01));
    }

    #[test]
    fn test_aggregation_order_independent() {
        let mut shuffled = micro_with(|_| 0.75);
        shuffled.reverse();
        let a = aggregate_all(&micro_with(|_| 0.75), &questionnaire(), None).unwrap();
        let b = aggregate_all(&shuffled, &questionnaire(), None).unwrap();
        assert_eq!(a.macro_score.score, b.macro_score.score);
        assert_eq!(a.dimension_scores, b.dimension_scores);
    }

    #[test]
    fn test_empty_micro_rejected() {
        let err = aggregate_all(&[], &questionnaire(), None).unwrap_err();
        assert_eq!(err.exit_code(), 30);
    }

    #[test]
    fn test_missing_cell_is_critical() {
        let mut micro = micro_with(|_| 0.8);
        micro.retain(|m| m.question_id.global() != 17);
        let err = aggregate_all(&micro, &questionnaire(), None).unwrap_err();
        assert_eq!(err.exit_code(), 30);
        assert!(err.to_string().contains("AGG-004"));
    }

    #[test]
    fn test_zero_scores_allowed_when_inputs_zero() {
        // An all-zero plan is a valid (terrible) outcome, not an error.
        let outcome = aggregate_all(&micro_with(|_| 0.0), &questionnaire(), None).unwrap();
        assert_eq!(outcome.macro_score.score, 0.0);
        assert_eq!(
            outcome.macro_score.quality_level,
            QualityLevel::Insuficiente
        );
        assert_eq!(outcome.macro_score.strategic.systemic_gaps.len(), 60);
    }

    #[test]
    fn test_bootstrap_intervals_attached() {
        let outcome = aggregate_all(&micro_with(|_| 0.8), &questionnaire(), Some(9)).unwrap();
        assert!(
            outcome
                .dimension_scores
                .iter()
                .all(|d| d.confidence_interval_95.is_some())
        );
    }
}
