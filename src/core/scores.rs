//! Score objects for every level of the aggregation tree.
//!
//! Micro scores live on the `[0, 1]` scale with a normalized companion on
//! `[0, 3]`; every aggregated level reports on the `[0, 3]` output scale.

use crate::core::ids::{Cluster, Dimension, PolicyArea, QuestionId};
use crate::core::thresholds::QualityLevel;
use serde::{Deserialize, Serialize};

/// Maximum score on the output scale.
pub const MAX_SCORE: f64 = 3.0;

/// A 95% confidence (or credible) interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Creates an interval, ordering the bounds.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { lower: a, upper: b }
        } else {
            Self { lower: b, upper: a }
        }
    }

    /// Interval width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Execution trace retained with each micro score for provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Methods executed, in contract order.
    pub methods_run: Vec<String>,

    /// Signals irrigated into the task from its policy-area pack.
    pub irrigated_signals: Vec<String>,

    /// Signals actually consulted by at least one method.
    pub used_signals: Vec<String>,

    /// Validation failures recorded for the question (severity-prefixed).
    pub validation_failures: Vec<String>,

    /// Whether the method pipeline was retried after a first failure.
    pub retried: bool,
}

/// The scored outcome of one micro-question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMicroQuestion {
    /// Question identity.
    pub question_id: QuestionId,

    /// Policy area coordinate.
    pub policy_area: PolicyArea,

    /// Dimension coordinate.
    pub dimension: Dimension,

    /// Calibrated score on `[0, 1]`.
    pub score: f64,

    /// Score rescaled to the `[0, 3]` output scale.
    pub normalized_score: f64,

    /// Quality label derived from the loaded thresholds.
    pub quality_level: QualityLevel,

    /// 95% credible interval for the calibrated score, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_interval_95: Option<ConfidenceInterval>,

    /// SHA-256 digest of the question's evidence graph.
    pub evidence_digest: String,

    /// Provenance trace.
    pub trace: ExecutionTrace,
}

/// Aggregated score of the 5 micro-questions in one (PA, DIM) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Policy area coordinate.
    pub policy_area: PolicyArea,

    /// Dimension coordinate.
    pub dimension: Dimension,

    /// Weighted mean on the `[0, 3]` output scale.
    pub score: f64,

    /// Quality label on the `[0, 1]` scale before rescaling.
    pub quality_level: QualityLevel,

    /// Contributing micro-questions in global order.
    pub contributing_questions: Vec<QuestionId>,

    /// Bootstrap 95% confidence interval, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_interval_95: Option<ConfidenceInterval>,
}

/// Aggregated score of the 6 dimensions in one policy area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaScore {
    /// Policy area.
    pub policy_area: PolicyArea,

    /// Weighted mean on the `[0, 3]` scale.
    pub score: f64,

    /// Quality label.
    pub quality_level: QualityLevel,

    /// Contributing dimensions in numeric order.
    pub contributing_dimensions: Vec<Dimension>,

    /// Coherence derived from dimension dispersion (`1 - min(std/MAX, 1)`).
    pub coherence: f64,
}

/// Dispersion shape of a cluster's member-area scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispersionShape {
    /// Scores tightly packed.
    Uniform,
    /// Moderate spread around the mean.
    Clustered,
    /// Two separated groups of scores.
    Bimodal,
    /// Wide spread without grouping.
    Dispersed,
}

impl DispersionShape {
    /// Multiplicative factor the shape contributes to the dispersion
    /// penalty.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Bimodal => 1.3,
            _ => 1.0,
        }
    }
}

/// Aggregated score of a cluster's member areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterScore {
    /// Cluster identity.
    pub cluster: Cluster,

    /// Adjusted score (weighted mean times penalty factor) on `[0, 3]`.
    pub score: f64,

    /// Weighted mean before the dispersion penalty.
    pub weighted_mean: f64,

    /// Penalty factor applied (`>= 0.5` by construction).
    pub penalty_factor: f64,

    /// Coefficient of variation of the member scores.
    pub coefficient_of_variation: f64,

    /// Classified dispersion shape.
    pub shape: DispersionShape,

    /// Cluster coherence (`1 - min(std/MAX, 1)`).
    pub coherence: f64,

    /// Quality label.
    pub quality_level: QualityLevel,

    /// Member policy areas in numeric order.
    pub contributing_areas: Vec<PolicyArea>,
}

/// Strategic metrics derived over the full PA x DIM matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicMetrics {
    /// Share of (PA, DIM) cells at or above the acceptable threshold.
    pub coverage_rate: f64,

    /// Dimensions ranked by mean score, best first.
    pub dimension_ranking: Vec<DimensionRank>,

    /// Balance across policy areas (`1 - normalized variance`).
    pub balance_score: f64,

    /// Mean coherence across the four clusters.
    pub cluster_coherence: f64,

    /// (PA, DIM) cells scoring below the acceptable threshold.
    pub systemic_gaps: Vec<SystemicGap>,
}

/// One entry of the dimension ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRank {
    /// The dimension.
    pub dimension: Dimension,
    /// Mean score of the dimension across all policy areas, on `[0, 3]`.
    pub mean_score: f64,
}

/// One systemic gap cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemicGap {
    /// Policy area of the gap.
    pub policy_area: PolicyArea,
    /// Dimension of the gap.
    pub dimension: Dimension,
}

/// The single top-level score of the evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroScore {
    /// Weighted mean of the four cluster scores on `[0, 3]`.
    pub score: f64,

    /// Quality label.
    pub quality_level: QualityLevel,

    /// Cross-cutting coherence (mean of cluster coherences).
    pub coherence: f64,

    /// Contributing clusters in numeric order.
    pub contributing_clusters: Vec<Cluster>,

    /// Derived strategic metrics.
    pub strategic: StrategicMetrics,
}
