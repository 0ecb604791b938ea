//! Contract schema (version 3).
//!
//! A contract is the per-question declarative bundle: identity, the ordered
//! method pipeline, the question context (text, patterns, expected
//! elements), signal requirements, assembly and validation rules, and the
//! output schema. Contracts are sealed by a SHA-256 over their canonical
//! serialization.

use crate::core::ids::{BaseSlot, Dimension, PolicyArea, QuestionId};
use crate::error::{ContractError, Result};
use crate::hashing::canonical_sha256;
use crate::questionnaire::PatternSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The contract schema version this pipeline consumes.
pub const CONTRACT_VERSION: u32 = 3;

/// Identity block of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractIdentity {
    /// Question identifier.
    pub question_id: QuestionId,

    /// Declared policy area.
    pub policy_area_id: PolicyArea,

    /// Declared dimension.
    pub dimension_id: Dimension,

    /// Declared base slot.
    pub base_slot: BaseSlot,
}

/// One entry of the ordered method pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBinding {
    /// Method class name (e.g. "text_miner").
    pub class_name: String,

    /// Method name within the class (e.g. "extract_patterns").
    pub method_name: String,

    /// Execution priority; bindings run in ascending priority order.
    pub priority: u32,

    /// Namespaced key the method publishes its output under.
    pub provides: String,
}

/// One element the evidence is expected to contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedElement {
    /// Element type tag (e.g. "indicador", "meta", "presupuesto").
    #[serde(rename = "type")]
    pub element_type: String,

    /// Whether absence is a defect.
    pub required: bool,

    /// Minimum number of instances expected.
    pub minimum: usize,

    /// Human-readable description.
    pub description: String,
}

/// Question context: text, applicable patterns and expected elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionContext {
    /// Verbatim question text (Spanish).
    pub question_text: String,

    /// Patterns declared for this question.
    pub patterns: Vec<PatternSpec>,

    /// Elements the evidence must surface.
    pub expected_elements: Vec<ExpectedElement>,
}

/// Signal requirements declared by the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRequirements {
    /// Signals that must resolve from the policy-area pack.
    pub mandatory_signals: Vec<String>,

    /// Signals used when available.
    pub optional_signals: Vec<String>,

    /// Aggregation strategy name for signal scores.
    pub aggregation: String,

    /// Minimum fraction of mandatory signals that must fire.
    pub minimum_signal_threshold: f64,
}

/// Merge strategy of one assembly rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Ordered list union of all sources.
    Concat,
    /// First non-empty source.
    First,
    /// Plurality vote, ties broken by source order.
    Majority,
    /// Numeric mean with per-source weights.
    WeightedMean,
    /// Insert nodes and edges into the evidence graph.
    GraphConstruction,
}

/// One evidence-assembly rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRule {
    /// Key of the assembled output.
    pub target: String,

    /// Context keys consumed, in order.
    pub sources: Vec<String>,

    /// How the sources merge.
    pub merge_strategy: MergeStrategy,

    /// Per-source weights for `weighted_mean` (must sum to 1 ± 1e-6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

/// Evidence assembly block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAssembly {
    /// Assembly rules, applied in order.
    pub assembly_rules: Vec<AssemblyRule>,

    /// Policy for critical validation failures.
    pub na_policy: String,
}

/// Severity of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Cosmetic issue.
    Cosmetic,
    /// Minor issue.
    Minor,
    /// Major issue.
    Major,
    /// Critical issue; aborts the question under `abort_on_critical`.
    Critical,
}

impl Severity {
    /// Canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Cosmetic => "COSMETIC",
        }
    }
}

/// Constraint kind of one validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationConstraint {
    /// At least `min` evidence elements were found.
    MinElements {
        /// Minimum element count.
        min: usize,
    },
    /// At least one element of the given type was found.
    RequiredElementType {
        /// Required element type tag.
        element_type: String,
    },
    /// Mean element confidence is at least `min`.
    MinConfidence {
        /// Minimum mean confidence.
        min: f64,
    },
    /// At least one pattern match was recorded.
    NonEmptyMatches,
}

/// Field-level constraint on the assembled evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Evidence field the rule inspects.
    pub field: String,

    /// The constraint.
    pub constraint: ValidationConstraint,

    /// Severity when the constraint fails.
    pub severity: Severity,
}

/// Output schema block of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputContract {
    /// Required fields of the per-question result.
    pub required: Vec<String>,
}

/// The full version-3 contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Schema version; must equal [`CONTRACT_VERSION`].
    pub schema_version: u32,

    /// Identity block.
    pub identity: ContractIdentity,

    /// Ordered method pipeline.
    pub method_binding: Vec<MethodBinding>,

    /// Question context.
    pub question_context: QuestionContext,

    /// Signal requirements.
    pub signal_requirements: SignalRequirements,

    /// Evidence assembly block.
    pub evidence_assembly: EvidenceAssembly,

    /// Validation rules over the assembled evidence.
    pub validation_rules: Vec<ValidationRule>,

    /// Output schema.
    pub output_contract: OutputContract,

    /// SHA-256 over the canonical serialization with this field empty.
    pub contract_hash: String,
}

impl Contract {
    /// Recomputes the contract hash from the canonical serialization.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn compute_hash(&self) -> Result<String> {
        let mut unsealed = self.clone();
        unsealed.contract_hash = String::new();
        canonical_sha256(&unsealed)
    }

    /// Seals the contract by recording its canonical hash.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn seal(mut self) -> Result<Self> {
        self.contract_hash = self.compute_hash()?;
        Ok(self)
    }

    /// The method composition: the structural fingerprint shared across a
    /// positional group (class, method, provides per binding, in order).
    #[must_use]
    pub fn method_composition(&self) -> Vec<(String, String, String)> {
        self.method_binding
            .iter()
            .map(|b| {
                (
                    b.class_name.clone(),
                    b.method_name.clone(),
                    b.provides.clone(),
                )
            })
            .collect()
    }

    /// Verifies well-formedness checks A1–A4 and the hash seal.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContractError`] found.
    pub fn validate(&self) -> Result<()> {
        let qid = self.identity.question_id;

        // Hash seal.
        let computed = self.compute_hash()?;
        if computed != self.contract_hash {
            return Err(ContractError::HashMismatch {
                question_id: qid.to_string(),
                recorded: self.contract_hash.clone(),
                computed,
            }
            .into());
        }

        // A1: identity consistent with the positional layout and version.
        if self.schema_version != CONTRACT_VERSION {
            return Err(ContractError::IdentityMismatch {
                question_id: qid.to_string(),
                reason: format!(
                    "schema version {} (expected {CONTRACT_VERSION})",
                    self.schema_version
                ),
            }
            .into());
        }
        if self.identity.policy_area_id != qid.policy_area() {
            return Err(ContractError::IdentityMismatch {
                question_id: qid.to_string(),
                reason: format!(
                    "policy area {} (layout says {})",
                    self.identity.policy_area_id,
                    qid.policy_area()
                ),
            }
            .into());
        }
        if self.identity.dimension_id != qid.dimension()
            || self.identity.base_slot != qid.base_slot()
        {
            return Err(ContractError::IdentityMismatch {
                question_id: qid.to_string(),
                reason: "dimension or base slot disagrees with layout".to_string(),
            }
            .into());
        }

        // A2: every assembly source appears in some binding's provides.
        let provides: BTreeSet<&str> = self
            .method_binding
            .iter()
            .map(|b| b.provides.as_str())
            .collect();
        for rule in &self.evidence_assembly.assembly_rules {
            for source in &rule.sources {
                if !provides.contains(source.as_str()) {
                    return Err(ContractError::UnknownAssemblySource {
                        question_id: qid.to_string(),
                        source_key: source.clone(),
                    }
                    .into());
                }
            }
        }

        // A3: positive threshold whenever mandatory signals exist.
        if !self.signal_requirements.mandatory_signals.is_empty()
            && self.signal_requirements.minimum_signal_threshold <= 0.0
        {
            return Err(ContractError::ZeroSignalThreshold {
                question_id: qid.to_string(),
            }
            .into());
        }

        // A4: the output schema requires the evidence field.
        if !self
            .output_contract
            .required
            .iter()
            .any(|f| f == "evidence")
        {
            return Err(ContractError::OutputSchema {
                question_id: qid.to_string(),
                reason: "required set does not include 'evidence'".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::catalog::contract_for;

    #[test]
    fn test_sealed_contract_validates() {
        let contract = contract_for(QuestionId::new(1).unwrap());
        contract.validate().unwrap();
    }

    #[test]
    fn test_hash_mismatch_detected() {
        let mut contract = contract_for(QuestionId::new(1).unwrap());
        contract.question_context.question_text.push('!');
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_identity_mismatch_detected() {
        let mut contract = contract_for(QuestionId::new(1).unwrap());
        contract.identity.policy_area_id = PolicyArea::Pa05;
        let contract = contract.seal().unwrap();
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("policy area"));
    }

    #[test]
    fn test_unknown_assembly_source_detected() {
        let mut contract = contract_for(QuestionId::new(50).unwrap());
        contract.evidence_assembly.assembly_rules.push(AssemblyRule {
            target: "broken".to_string(),
            sources: vec!["nonexistent.provides".to_string()],
            merge_strategy: MergeStrategy::Concat,
            weights: None,
        });
        let contract = contract.seal().unwrap();
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("nonexistent.provides"));
    }

    #[test]
    fn test_zero_threshold_detected() {
        let mut contract = contract_for(QuestionId::new(2).unwrap());
        contract.signal_requirements.minimum_signal_threshold = 0.0;
        let contract = contract.seal().unwrap();
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("positive threshold"));
    }

    #[test]
    fn test_missing_evidence_field_detected() {
        let mut contract = contract_for(QuestionId::new(3).unwrap());
        contract.output_contract.required.retain(|f| f != "evidence");
        let contract = contract.seal().unwrap();
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("evidence"));
    }

    #[test]
    fn test_method_composition_is_positional() {
        let a = contract_for(QuestionId::new(5).unwrap());
        let b = contract_for(QuestionId::new(275).unwrap());
        assert_eq!(a.method_composition(), b.method_composition());
        assert_ne!(a.identity.policy_area_id, b.identity.policy_area_id);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Cosmetic < Severity::Minor);
        assert!(Severity::Major < Severity::Critical);
        assert_eq!(Severity::Critical.as_str(), "CRITICAL");
    }

    #[test]
    fn test_merge_strategy_serde_form() {
        let json = serde_json::to_string(&MergeStrategy::WeightedMean).unwrap();
        assert_eq!(json, "\"weighted_mean\"");
        let back: MergeStrategy = serde_json::from_str("\"graph_construction\"").unwrap();
        assert_eq!(back, MergeStrategy::GraphConstruction);
    }
}
