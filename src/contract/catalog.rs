//! Built-in contract catalog.
//!
//! Generates the canonical version-3 contract for any question from the
//! fixed positional layout: every question in a positional group gets the
//! same method composition, patterns and expected elements, differing only
//! in policy-area identity. DEV smoke runs use this catalog when no
//! contracts directory is supplied; the test suite builds its fixtures from
//! it.

use crate::contract::schema::{
    AssemblyRule, CONTRACT_VERSION, Contract, ContractIdentity, EvidenceAssembly, ExpectedElement,
    MergeStrategy, MethodBinding, OutputContract, QuestionContext, Severity, SignalRequirements,
    ValidationConstraint, ValidationRule,
};
use crate::core::ids::{Dimension, QuestionId};
use crate::questionnaire::PatternSpec;

/// Per-dimension specialist binding appended to the shared pipeline.
fn specialist_binding(dimension: Dimension) -> MethodBinding {
    let (class_name, method_name, provides) = match dimension {
        Dimension::Dim01 | Dimension::Dim02 => (
            "numeric_analyzer",
            "analyze_quantities",
            "numeric.quantities",
        ),
        Dimension::Dim03 => ("temporal_verifier", "verify_timeline", "temporal.ordering"),
        Dimension::Dim04 => ("causal_extractor", "extract_relations", "causal.relations"),
        Dimension::Dim05 => (
            "contradiction_detector",
            "detect_conflicts",
            "contradiction.conflicts",
        ),
        Dimension::Dim06 => (
            "institutional_analyzer",
            "map_responsibilities",
            "institutional.actors",
        ),
    };
    MethodBinding {
        class_name: class_name.to_string(),
        method_name: method_name.to_string(),
        priority: 30,
        provides: provides.to_string(),
    }
}

/// The ordered method pipeline for a base slot.
fn method_binding(dimension: Dimension) -> Vec<MethodBinding> {
    let mut bindings = vec![
        MethodBinding {
            class_name: "text_miner".to_string(),
            method_name: "extract_patterns".to_string(),
            priority: 10,
            provides: "text_mining.pattern_matches".to_string(),
        },
        MethodBinding {
            class_name: "semantic_processor".to_string(),
            method_name: "assess_coverage".to_string(),
            priority: 20,
            provides: "semantic.elements".to_string(),
        },
        specialist_binding(dimension),
    ];
    if dimension == Dimension::Dim02 {
        bindings.push(MethodBinding {
            class_name: "financial_auditor".to_string(),
            method_name: "audit_allocations".to_string(),
            priority: 40,
            provides: "financial.allocations".to_string(),
        });
    }
    bindings.push(MethodBinding {
        class_name: "semantic_processor".to_string(),
        method_name: "score_question".to_string(),
        priority: 90,
        provides: "scoring.raw".to_string(),
    });
    bindings
}

/// Patterns declared for a dimension's questions.
fn patterns(dimension: Dimension) -> Vec<PatternSpec> {
    let mut patterns = vec![PatternSpec {
        id: format!("obj-{}", dimension.index()),
        pattern_type: "strategic".to_string(),
        regex: r"(?i)\b(objetivo|meta|estrategia|programa)\b".to_string(),
        weight: 0.6,
        policy_area: None,
    }];
    let extra = match dimension {
        Dimension::Dim01 => PatternSpec {
            id: "diag-base".to_string(),
            pattern_type: "diagnostic".to_string(),
            regex: r"(?i)\b(diagnóstico|línea base|situación actual)\b".to_string(),
            weight: 1.0,
            policy_area: None,
        },
        Dimension::Dim02 => PatternSpec {
            id: "quant-pct".to_string(),
            pattern_type: "quantitative".to_string(),
            regex: r"\d+(?:[.,]\d+)?\s*%".to_string(),
            weight: 1.0,
            policy_area: None,
        },
        Dimension::Dim03 => PatternSpec {
            id: "temp-year".to_string(),
            pattern_type: "temporal".to_string(),
            regex: r"\b(19|20)\d{2}\b".to_string(),
            weight: 1.0,
            policy_area: None,
        },
        Dimension::Dim04 => PatternSpec {
            id: "causal-marker".to_string(),
            pattern_type: "causal".to_string(),
            regex: r"(?i)\b(debido a|porque|genera|produce|conlleva|impacta)\b".to_string(),
            weight: 1.0,
            policy_area: None,
        },
        Dimension::Dim05 => PatternSpec {
            id: "coherence-marker".to_string(),
            pattern_type: "coherence".to_string(),
            regex: r"(?i)\b(articulación|coordinación|concordancia|alineación)\b".to_string(),
            weight: 1.0,
            policy_area: None,
        },
        Dimension::Dim06 => PatternSpec {
            id: "inst-actor".to_string(),
            pattern_type: "institutional".to_string(),
            regex: r"(?i)\b(secretaría|alcaldía|dirección|instituto|ministerio)\b".to_string(),
            weight: 1.0,
            policy_area: None,
        },
    };
    patterns.push(extra);
    patterns
}

/// Expected evidence elements for a dimension's questions.
fn expected_elements(dimension: Dimension) -> Vec<ExpectedElement> {
    let specialist = match dimension {
        Dimension::Dim01 => ("diagnóstico", "caracterización de la situación actual"),
        Dimension::Dim02 => ("indicador", "indicador cuantitativo con magnitud"),
        Dimension::Dim03 => ("hito", "hito temporal fechado"),
        Dimension::Dim04 => ("relación_causal", "vínculo causa-efecto explícito"),
        Dimension::Dim05 => ("articulación", "referencia de coherencia interna"),
        Dimension::Dim06 => ("responsable", "actor institucional responsable"),
    };
    vec![
        ExpectedElement {
            element_type: "objetivo".to_string(),
            required: true,
            minimum: 1,
            description: "objetivo o meta declarada".to_string(),
        },
        ExpectedElement {
            element_type: specialist.0.to_string(),
            required: false,
            minimum: 1,
            description: specialist.1.to_string(),
        },
    ]
}

/// Assembly rules for a base slot's pipeline.
fn assembly_rules(dimension: Dimension) -> Vec<AssemblyRule> {
    let specialist = specialist_binding(dimension).provides;
    let mut graph_sources = vec!["semantic.elements".to_string(), specialist];
    if dimension == Dimension::Dim02 {
        graph_sources.push("financial.allocations".to_string());
    }
    vec![
        AssemblyRule {
            target: "elements_found".to_string(),
            sources: vec!["semantic.elements".to_string()],
            merge_strategy: MergeStrategy::Concat,
            weights: None,
        },
        AssemblyRule {
            target: "pattern_matches".to_string(),
            sources: vec!["text_mining.pattern_matches".to_string()],
            merge_strategy: MergeStrategy::Concat,
            weights: None,
        },
        AssemblyRule {
            target: "graph".to_string(),
            sources: graph_sources,
            merge_strategy: MergeStrategy::GraphConstruction,
            weights: None,
        },
        AssemblyRule {
            target: "raw_score".to_string(),
            // The quantitative dimension's raw score comes from the
            // calibrable numeric analyzer; everything else scores through
            // the semantic scorer.
            sources: if dimension == Dimension::Dim02 {
                vec!["numeric.quantities".to_string()]
            } else {
                vec!["scoring.raw".to_string()]
            },
            merge_strategy: MergeStrategy::First,
            weights: None,
        },
    ]
}

/// Builds the canonical sealed contract for one question.
#[must_use]
pub fn contract_for(question_id: QuestionId) -> Contract {
    let dimension = question_id.dimension();
    let contract = Contract {
        schema_version: CONTRACT_VERSION,
        identity: ContractIdentity {
            question_id,
            policy_area_id: question_id.policy_area(),
            dimension_id: dimension,
            base_slot: question_id.base_slot(),
        },
        method_binding: method_binding(dimension),
        question_context: QuestionContext {
            question_text: format!(
                "¿El plan aborda el aspecto {} del área {} en la dimensión {}?",
                question_id.base_slot(),
                question_id.policy_area(),
                dimension
            ),
            patterns: patterns(dimension),
            expected_elements: expected_elements(dimension),
        },
        signal_requirements: SignalRequirements {
            mandatory_signals: vec![format!("nucleo_dim{}", dimension.index())],
            optional_signals: vec!["contexto_pa".to_string()],
            aggregation: "weighted_mean".to_string(),
            minimum_signal_threshold: 0.5,
        },
        evidence_assembly: EvidenceAssembly {
            assembly_rules: assembly_rules(dimension),
            na_policy: "abort_on_critical".to_string(),
        },
        validation_rules: vec![
            ValidationRule {
                field: "elements_found".to_string(),
                constraint: ValidationConstraint::MinElements { min: 1 },
                severity: Severity::Major,
            },
            ValidationRule {
                field: "pattern_matches".to_string(),
                constraint: ValidationConstraint::NonEmptyMatches,
                severity: Severity::Minor,
            },
        ],
        output_contract: OutputContract {
            required: vec![
                "question_id".to_string(),
                "score".to_string(),
                "quality_level".to_string(),
                "evidence".to_string(),
            ],
        },
        contract_hash: String::new(),
    };
    // The catalog shape is always serializable, so sealing cannot fail in
    // practice; fall back to the unsealed form rather than panic.
    let hash = contract.compute_hash().unwrap_or_default();
    Contract {
        contract_hash: hash,
        ..contract
    }
}

/// Builds the full 300-contract catalog in global order.
#[must_use]
pub fn all_contracts() -> Vec<Contract> {
    QuestionId::all().map(contract_for).collect()
}
