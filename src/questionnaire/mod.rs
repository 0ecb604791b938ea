//! Questionnaire monolith loading and validation.
//!
//! The monolith carries the 300 questions with their positional layout, the
//! scoring thresholds, the cluster membership map and the default pattern
//! library. It is loaded once in Phase 0, validated structurally, and frozen
//! for the rest of the run.

use crate::core::ids::{
    BaseSlot, CLUSTER_COUNT, Cluster, Dimension, POLICY_AREA_COUNT, PolicyArea, QUESTION_COUNT,
    QuestionId,
};
use crate::core::thresholds::ScoreThresholds;
use crate::error::{IoError, QuestionnaireError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One question as declared by the monolith.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier (Q001..Q300).
    pub question_id: QuestionId,

    /// Global question number (1..=300).
    pub question_global: u16,

    /// Policy area the question belongs to.
    pub policy_area_id: PolicyArea,

    /// Dimension the question belongs to.
    pub dimension_id: Dimension,

    /// Base slot within the policy area.
    pub base_slot: BaseSlot,

    /// Question text (Spanish).
    pub text: String,
}

/// One entry of the default pattern library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Pattern identifier.
    pub id: String,

    /// Pattern type tag (e.g. "quantitative", "institutional").
    #[serde(rename = "type")]
    pub pattern_type: String,

    /// Regular expression source.
    pub regex: String,

    /// Pattern weight for match scoring.
    pub weight: f64,

    /// Policy area restriction; `None` means applicable everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_area: Option<PolicyArea>,
}

/// Raw threshold block as carried by the monolith file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawThresholds {
    #[serde(rename = "EXCELENTE")]
    excelente: f64,
    #[serde(rename = "BUENO")]
    bueno: f64,
    #[serde(rename = "ACEPTABLE")]
    aceptable: f64,
}

/// On-disk shape of the monolith file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawQuestionnaire {
    questions: Vec<Question>,
    scoring_thresholds: RawThresholds,
    clusters: BTreeMap<Cluster, Vec<PolicyArea>>,
    #[serde(default)]
    patterns: Vec<PatternSpec>,
}

/// The validated questionnaire monolith.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    questions: Vec<Question>,
    thresholds: ScoreThresholds,
    clusters: BTreeMap<Cluster, Vec<PolicyArea>>,
    patterns: Vec<PatternSpec>,
}

impl Questionnaire {
    /// Loads and validates the monolith from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails any
    /// structural validation.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let raw: RawQuestionnaire = serde_json::from_slice(&bytes)
            .map_err(|e| QuestionnaireError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Builds a validated questionnaire from already-parsed parts.
    ///
    /// # Errors
    ///
    /// Returns an error on any structural defect (counts, layout,
    /// thresholds, cluster partition).
    pub fn new(
        questions: Vec<Question>,
        thresholds: ScoreThresholds,
        clusters: BTreeMap<Cluster, Vec<PolicyArea>>,
        patterns: Vec<PatternSpec>,
    ) -> Result<Self> {
        let q = Self {
            questions,
            thresholds,
            clusters,
            patterns,
        };
        q.validate()?;
        Ok(q)
    }

    fn from_raw(raw: RawQuestionnaire) -> Result<Self> {
        let thresholds = ScoreThresholds::new(
            raw.scoring_thresholds.excelente,
            raw.scoring_thresholds.bueno,
            raw.scoring_thresholds.aceptable,
        )?;
        Self::new(raw.questions, thresholds, raw.clusters, raw.patterns)
    }

    fn validate(&self) -> Result<()> {
        if self.questions.len() != QUESTION_COUNT {
            return Err(QuestionnaireError::Count {
                reason: format!("expected {QUESTION_COUNT} questions, got {}", self.questions.len()),
            }
            .into());
        }

        // Positional layout: question k sits at the coordinates its global
        // number derives, and the list is ordered by global number.
        for (i, q) in self.questions.iter().enumerate() {
            let expected_global = u16::try_from(i + 1).unwrap_or(0);
            if q.question_global != expected_global {
                return Err(QuestionnaireError::Layout {
                    reason: format!(
                        "question at index {i} has global {}, expected {expected_global}",
                        q.question_global
                    ),
                }
                .into());
            }
            if q.question_id.global() != q.question_global {
                return Err(QuestionnaireError::Layout {
                    reason: format!("{}: id disagrees with global {}", q.question_id, q.question_global),
                }
                .into());
            }
            let id = q.question_id;
            if q.policy_area_id != id.policy_area()
                || q.dimension_id != id.dimension()
                || q.base_slot != id.base_slot()
            {
                return Err(QuestionnaireError::Layout {
                    reason: format!("{}: declared coordinates disagree with positional layout", id),
                }
                .into());
            }
            if q.text.trim().is_empty() {
                return Err(QuestionnaireError::Layout {
                    reason: format!("{id}: empty question text"),
                }
                .into());
            }
        }

        // Cluster membership must partition the ten policy areas.
        if self.clusters.len() != CLUSTER_COUNT {
            return Err(QuestionnaireError::ClusterMembership {
                reason: format!("expected {CLUSTER_COUNT} clusters, got {}", self.clusters.len()),
            }
            .into());
        }
        let mut seen: BTreeSet<PolicyArea> = BTreeSet::new();
        for (cluster, members) in &self.clusters {
            if members.is_empty() {
                return Err(QuestionnaireError::ClusterMembership {
                    reason: format!("{cluster} has no members"),
                }
                .into());
            }
            for pa in members {
                if !seen.insert(*pa) {
                    return Err(QuestionnaireError::ClusterMembership {
                        reason: format!("{pa} appears in more than one cluster"),
                    }
                    .into());
                }
            }
        }
        if seen.len() != POLICY_AREA_COUNT {
            return Err(QuestionnaireError::ClusterMembership {
                reason: format!("{} policy areas assigned, expected {POLICY_AREA_COUNT}", seen.len()),
            }
            .into());
        }

        Ok(())
    }

    /// The loaded scoring thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    /// All questions in global order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Looks up one question by id.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> &Question {
        // Positional layout was validated at construction.
        &self.questions[id.global() as usize - 1]
    }

    /// The cluster membership map.
    #[must_use]
    pub const fn clusters(&self) -> &BTreeMap<Cluster, Vec<PolicyArea>> {
        &self.clusters
    }

    /// Which cluster a policy area belongs to.
    #[must_use]
    pub fn cluster_of(&self, policy_area: PolicyArea) -> Cluster {
        self.clusters
            .iter()
            .find(|(_, members)| members.contains(&policy_area))
            .map_or(Cluster::C1, |(cluster, _)| *cluster)
    }

    /// The default pattern library.
    #[must_use]
    pub fn patterns(&self) -> &[PatternSpec] {
        &self.patterns
    }

    /// Patterns applicable to a policy area (unrestricted patterns plus
    /// those tagged for the area).
    #[must_use]
    pub fn patterns_for(&self, policy_area: PolicyArea) -> Vec<&PatternSpec> {
        self.patterns
            .iter()
            .filter(|p| p.policy_area.is_none_or(|pa| pa == policy_area))
            .collect()
    }
}

/// Generates the canonical question list for the fixed positional layout.
///
/// Question text is synthesized from the coordinates; callers that have the
/// real monolith text should prefer [`Questionnaire::load`]. This generator
/// backs DEV smoke runs and test fixtures.
#[must_use]
pub fn layout_questions() -> Vec<Question> {
    QuestionId::all()
        .map(|id| Question {
            question_id: id,
            question_global: id.global(),
            policy_area_id: id.policy_area(),
            dimension_id: id.dimension(),
            base_slot: id.base_slot(),
            text: format!(
                "¿El plan aborda el aspecto {} del área {} en la dimensión {}?",
                id.base_slot(),
                id.policy_area(),
                id.dimension()
            ),
        })
        .collect()
}

/// The standard cluster partition used when the monolith omits one.
#[must_use]
pub fn default_clusters() -> BTreeMap<Cluster, Vec<PolicyArea>> {
    let mut clusters = BTreeMap::new();
    clusters.insert(Cluster::C1, vec![PolicyArea::Pa01, PolicyArea::Pa02]);
    clusters.insert(
        Cluster::C2,
        vec![PolicyArea::Pa03, PolicyArea::Pa04, PolicyArea::Pa05],
    );
    clusters.insert(
        Cluster::C3,
        vec![PolicyArea::Pa06, PolicyArea::Pa07, PolicyArea::Pa08],
    );
    clusters.insert(Cluster::C4, vec![PolicyArea::Pa09, PolicyArea::Pa10]);
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn standard_thresholds() -> ScoreThresholds {
        ScoreThresholds::new(0.85, 0.70, 0.55).unwrap()
    }

    fn build_valid() -> Questionnaire {
        Questionnaire::new(
            layout_questions(),
            standard_thresholds(),
            default_clusters(),
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_layout_generator_is_valid() {
        let q = build_valid();
        assert_eq!(q.questions().len(), 300);
        assert_eq!(q.clusters().len(), 4);
    }

    #[test]
    fn test_question_lookup() {
        let q = build_valid();
        let question = q.question(QuestionId::new(61).unwrap());
        assert_eq!(question.policy_area_id, PolicyArea::Pa03);
        assert_eq!(question.base_slot.to_string(), "D1-Q1");
    }

    #[test]
    fn test_cluster_of() {
        let q = build_valid();
        assert_eq!(q.cluster_of(PolicyArea::Pa01), Cluster::C1);
        assert_eq!(q.cluster_of(PolicyArea::Pa10), Cluster::C4);
    }

    #[test]
    fn test_wrong_question_count_rejected() {
        let mut questions = layout_questions();
        questions.pop();
        let err = Questionnaire::new(
            questions,
            standard_thresholds(),
            default_clusters(),
            vec![],
        )
        .unwrap_err();
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let mut questions = layout_questions();
        questions[0].policy_area_id = PolicyArea::Pa02;
        let err = Questionnaire::new(
            questions,
            standard_thresholds(),
            default_clusters(),
            vec![],
        )
        .unwrap_err();
        assert!(err.to_string().contains("positional layout"));
    }

    #[test]
    fn test_cluster_partition_rejected_on_overlap() {
        let mut clusters = default_clusters();
        if let Some(members) = clusters.get_mut(&Cluster::C4) {
            members.push(PolicyArea::Pa01);
        }
        let err =
            Questionnaire::new(layout_questions(), standard_thresholds(), clusters, vec![])
                .unwrap_err();
        assert!(err.to_string().contains("more than one cluster"));
    }

    #[test]
    fn test_cluster_partition_rejected_on_gap() {
        let mut clusters = default_clusters();
        if let Some(members) = clusters.get_mut(&Cluster::C4) {
            members.retain(|pa| *pa != PolicyArea::Pa10);
        }
        let err =
            Questionnaire::new(layout_questions(), standard_thresholds(), clusters, vec![])
                .unwrap_err();
        assert!(err.to_string().contains("expected 10"));
    }

    #[test]
    fn test_patterns_for_filters_by_area() {
        let patterns = vec![
            PatternSpec {
                id: "global".to_string(),
                pattern_type: "quantitative".to_string(),
                regex: r"\d+%".to_string(),
                weight: 1.0,
                policy_area: None,
            },
            PatternSpec {
                id: "pa02-only".to_string(),
                pattern_type: "institutional".to_string(),
                regex: "secretaría".to_string(),
                weight: 0.5,
                policy_area: Some(PolicyArea::Pa02),
            },
        ];
        let q = Questionnaire::new(
            layout_questions(),
            standard_thresholds(),
            default_clusters(),
            patterns,
        )
        .unwrap();
        assert_eq!(q.patterns_for(PolicyArea::Pa01).len(), 1);
        assert_eq!(q.patterns_for(PolicyArea::Pa02).len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let raw = RawQuestionnaire {
            questions: layout_questions(),
            scoring_thresholds: RawThresholds {
                excelente: 0.85,
                bueno: 0.70,
                aceptable: 0.55,
            },
            clusters: default_clusters(),
            patterns: vec![],
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&raw).unwrap().as_bytes())
            .unwrap();
        let q = Questionnaire::load(file.path()).unwrap();
        assert_eq!(q.questions().len(), 300);
        assert!((q.thresholds().excelente - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_bad_thresholds() {
        let raw = RawQuestionnaire {
            questions: layout_questions(),
            scoring_thresholds: RawThresholds {
                excelente: 0.55,
                bueno: 0.70,
                aceptable: 0.85,
            },
            clusters: default_clusters(),
            patterns: vec![],
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&raw).unwrap().as_bytes())
            .unwrap();
        assert!(Questionnaire::load(file.path()).is_err());
    }
}
