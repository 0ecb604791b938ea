//! Report assembly and schema validation.

use crate::core::ids::{Dimension, PolicyArea, QuestionId};
use crate::core::scores::{
    AreaScore, ClusterScore, DimensionScore, MacroScore, ScoredMicroQuestion,
};
use crate::core::thresholds::QualityLevel;
use crate::error::{RenderError, Result};
use crate::hashing::sha256_hex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One micro-question row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroRow {
    /// Question identifier.
    pub question_id: QuestionId,

    /// Policy area coordinate.
    pub policy_area: PolicyArea,

    /// Dimension coordinate.
    pub dimension: Dimension,

    /// Calibrated score on `[0, 1]`.
    pub score: f64,

    /// Score on the `[0, 3]` output scale.
    pub normalized_score: f64,

    /// Quality label.
    pub quality_level: QualityLevel,

    /// Evidence graph digest.
    pub evidence_digest: String,

    /// Synthesized narrative.
    pub narrative: String,
}

/// The validated final report object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report identifier, derived from the plan id and macro score.
    pub report_id: String,

    /// Generation timestamp (isolated from the deterministic body).
    pub generated_at: DateTime<Utc>,

    /// Correlation id of the run.
    pub correlation_id: String,

    /// The plan id the report describes.
    pub plan_id: String,

    /// Macro summary.
    pub macro_score: MacroScore,

    /// The four cluster tables.
    pub cluster_scores: Vec<ClusterScore>,

    /// The ten area tables.
    pub area_scores: Vec<AreaScore>,

    /// The sixty dimension rows.
    pub dimension_scores: Vec<DimensionScore>,

    /// The three hundred micro rows.
    pub micro: Vec<MicroRow>,
}

impl AnalysisReport {
    /// Assembles the report from the aggregation outcome and per-question
    /// results.
    #[must_use]
    pub fn assemble(
        correlation_id: &str,
        plan_id: &str,
        macro_score: MacroScore,
        cluster_scores: Vec<ClusterScore>,
        area_scores: Vec<AreaScore>,
        dimension_scores: Vec<DimensionScore>,
        scored: &[ScoredMicroQuestion],
        narratives: &[String],
    ) -> Self {
        let micro: Vec<MicroRow> = scored
            .iter()
            .zip(narratives)
            .map(|(s, narrative)| MicroRow {
                question_id: s.question_id,
                policy_area: s.policy_area,
                dimension: s.dimension,
                score: s.score,
                normalized_score: s.normalized_score,
                quality_level: s.quality_level,
                evidence_digest: s.evidence_digest.clone(),
                narrative: narrative.clone(),
            })
            .collect();

        let report_id = sha256_hex(
            format!("{plan_id}:{:.12}", macro_score.score).as_bytes(),
        );

        Self {
            report_id,
            generated_at: Utc::now(),
            correlation_id: correlation_id.to_string(),
            plan_id: plan_id.to_string(),
            macro_score,
            cluster_scores,
            area_scores,
            dimension_scores,
            micro,
        }
    }

    /// Validates the report against its schema: level counts and score
    /// bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError::Schema`] describing the first defect.
    pub fn validate(&self) -> Result<()> {
        let defect = |message: String| -> crate::error::Error {
            RenderError::Schema(message).into()
        };
        if self.cluster_scores.len() != 4 {
            return Err(defect(format!(
                "expected 4 cluster tables, got {}",
                self.cluster_scores.len()
            )));
        }
        if self.area_scores.len() != 10 {
            return Err(defect(format!(
                "expected 10 area tables, got {}",
                self.area_scores.len()
            )));
        }
        if self.dimension_scores.len() != 60 {
            return Err(defect(format!(
                "expected 60 dimension rows, got {}",
                self.dimension_scores.len()
            )));
        }
        if self.micro.len() != 300 {
            return Err(defect(format!(
                "expected 300 micro rows, got {}",
                self.micro.len()
            )));
        }
        for row in &self.micro {
            if !(0.0..=1.0).contains(&row.score) {
                return Err(defect(format!(
                    "{}: micro score {} outside [0, 1]",
                    row.question_id, row.score
                )));
            }
        }
        if !(0.0..=3.0).contains(&self.macro_score.score) {
            return Err(defect(format!(
                "macro score {} outside [0, 3]",
                self.macro_score.score
            )));
        }
        Ok(())
    }

    /// The evidence-chain hash: SHA-256 over the concatenated sorted
    /// evidence digests.
    #[must_use]
    pub fn evidence_chain_hash(&self) -> String {
        let mut digests: Vec<&str> = self
            .micro
            .iter()
            .map(|m| m.evidence_digest.as_str())
            .collect();
        digests.sort_unstable();
        sha256_hex(digests.concat().as_bytes())
    }
}
