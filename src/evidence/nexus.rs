//! Evidence nexus (C7): per-question execution.
//!
//! Runs the contract's method pipeline over the bound chunk, assembles the
//! evidence object via the contract's rules, infers implicit relationships,
//! propagates beliefs, validates and emits the assembled evidence with its
//! graph digest. Failures stay local to the question.

use crate::contract::schema::{Contract, MergeStrategy};
use crate::core::ids::QuestionId;
use crate::core::scores::ExecutionTrace;
use crate::error::MethodError;
use crate::evidence::assembly::{build_graph, merge_rule};
use crate::evidence::inference::infer_relations;
use crate::evidence::propagation::propagate_beliefs;
use crate::evidence::validation::{ValidationOutcome, validate_evidence};
use crate::methods::context::{MethodArgs, MethodValue, QuestionStore};
use crate::methods::executor::MethodExecutor;
use crate::methods::router::required_only;
use crate::methods::suite::{KEY_CHUNK_TEXT, KEY_EXPECTED, KEY_PATTERNS, KEY_SIGNALS};
use crate::plan::task::ExecutableTask;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// The assembled evidence object of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledEvidence {
    /// Elements found in the chunk.
    pub elements_found: MethodValue,

    /// Pattern matches recorded by text mining.
    pub pattern_matches: MethodValue,

    /// Mean confidence per fact kind plus an "overall" entry.
    pub confidence_scores: BTreeMap<String, f64>,

    /// Assembly metadata (score components, signal hits, propagation
    /// statistics).
    pub metadata: BTreeMap<String, MethodValue>,

    /// SHA-256 digest of the evidence graph.
    pub graph_digest: String,
}

impl AssembledEvidence {
    fn empty() -> Self {
        Self {
            elements_found: MethodValue::List(vec![]),
            pattern_matches: MethodValue::List(vec![]),
            confidence_scores: BTreeMap::new(),
            metadata: BTreeMap::new(),
            graph_digest: crate::evidence::graph::EvidenceGraph::new().digest(),
        }
    }
}

/// Outcome of executing one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    /// Question identity.
    pub question_id: QuestionId,

    /// Raw score before calibration (zeroed when the question aborted).
    pub raw_score: f64,

    /// (class, method) that produced the raw score, for calibration
    /// delegation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_score_provider: Option<(String, String)>,

    /// Assembled evidence.
    pub evidence: AssembledEvidence,

    /// Validation outcome.
    pub validation: ValidationOutcome,

    /// Provenance trace.
    pub trace: ExecutionTrace,

    /// Whether the question aborted (method double-failure or critical
    /// validation under `abort_on_critical`).
    pub aborted: bool,
}

fn default_optional_arg(key: &str) -> Option<MethodValue> {
    match key {
        "max_matches" => Some(MethodValue::Integer(200)),
        "max_relations" => Some(MethodValue::Integer(50)),
        "min_confidence" => Some(MethodValue::Float(0.3)),
        _ => None,
    }
}

fn pattern_value(pattern: &crate::questionnaire::PatternSpec) -> MethodValue {
    let mut map = BTreeMap::new();
    map.insert("id".to_string(), MethodValue::from(pattern.id.as_str()));
    map.insert(
        "type".to_string(),
        MethodValue::from(pattern.pattern_type.as_str()),
    );
    map.insert("regex".to_string(), MethodValue::from(pattern.regex.as_str()));
    map.insert("weight".to_string(), MethodValue::Float(pattern.weight));
    MethodValue::Map(map)
}

fn signal_value(signal: &crate::signal::pack::SignalDescriptor, mandatory: bool) -> MethodValue {
    let mut map = BTreeMap::new();
    map.insert("name".to_string(), MethodValue::from(signal.name.as_str()));
    map.insert(
        "pattern".to_string(),
        MethodValue::from(signal.pattern.as_str()),
    );
    map.insert("weight".to_string(), MethodValue::Float(signal.weight));
    map.insert(
        "scoring_context".to_string(),
        MethodValue::from(signal.scoring_context.as_str()),
    );
    map.insert("mandatory".to_string(), MethodValue::Boolean(mandatory));
    MethodValue::Map(map)
}

fn element_value(element: &crate::contract::schema::ExpectedElement) -> MethodValue {
    let mut map = BTreeMap::new();
    map.insert(
        "type".to_string(),
        MethodValue::from(element.element_type.as_str()),
    );
    map.insert("required".to_string(), MethodValue::Boolean(element.required));
    #[allow(clippy::cast_possible_wrap)]
    map.insert(
        "minimum".to_string(),
        MethodValue::Integer(element.minimum as i64),
    );
    map.insert(
        "description".to_string(),
        MethodValue::from(element.description.as_str()),
    );
    MethodValue::Map(map)
}

/// Pre-populates the per-question store with the task's irrigation.
fn seed_store(task: &ExecutableTask) -> QuestionStore {
    let mut store = QuestionStore::new();
    // Seeding a fresh store cannot collide.
    let _ = store.publish(KEY_CHUNK_TEXT, MethodValue::from(task.chunk_text.as_str()));
    let _ = store.publish(
        KEY_PATTERNS,
        MethodValue::List(task.applicable_patterns.iter().map(pattern_value).collect()),
    );
    let mut signals: Vec<MethodValue> = task
        .resolved_signals
        .mandatory
        .iter()
        .map(|s| signal_value(s, true))
        .collect();
    signals.extend(task.resolved_signals.optional.iter().map(|s| signal_value(s, false)));
    let _ = store.publish(KEY_SIGNALS, MethodValue::List(signals));
    let _ = store.publish(
        KEY_EXPECTED,
        MethodValue::List(task.expected_elements.iter().map(element_value).collect()),
    );
    store
}

/// Executes one question end to end.
#[allow(clippy::too_many_lines)]
#[must_use]
pub fn execute_question(
    task: &ExecutableTask,
    contract: &Contract,
    executor: &MethodExecutor,
) -> QuestionOutcome {
    let mut store = seed_store(task);
    let mut trace = ExecutionTrace {
        irrigated_signals: task.resolved_signals.names(),
        ..ExecutionTrace::default()
    };

    // Execution: contract order, ascending priority.
    let mut bindings = contract.method_binding.clone();
    bindings.sort_by_key(|b| b.priority);

    for binding in &bindings {
        let spec = match executor.get(&binding.class_name, &binding.method_name) {
            Ok(method) => method.arg_spec(),
            Err(e) => {
                return failed_outcome(task.question_id, trace, e);
            }
        };
        let mut args = MethodArgs::new();
        args.insert(
            "text".to_string(),
            MethodValue::from(task.chunk_text.as_str()),
        );
        for key in spec.optional {
            if let Some(value) = default_optional_arg(key) {
                args.insert((*key).to_string(), value);
            }
        }

        let output = executor
            .invoke(&binding.class_name, &binding.method_name, &args, &store)
            .or_else(|first_failure| {
                // One retry with the optional arguments stripped.
                warn!(
                    method = %binding.method_name,
                    error = %first_failure,
                    "method failed; retrying with required arguments only"
                );
                trace.retried = true;
                let stripped = required_only(&spec, &args);
                executor.invoke(&binding.class_name, &binding.method_name, &stripped, &store)
            });

        match output {
            Ok(value) => {
                trace
                    .methods_run
                    .push(format!("{}.{}", binding.class_name, binding.method_name));
                if let Err(e) = store.publish(&binding.provides, value) {
                    return failed_outcome(task.question_id, trace, e);
                }
            }
            Err(e) => {
                return failed_outcome(task.question_id, trace, e);
            }
        }
    }

    // Graph construction and scalar assembly.
    let mut assembled: BTreeMap<String, MethodValue> = BTreeMap::new();
    let mut graph = crate::evidence::graph::EvidenceGraph::new();
    let mut raw_score_provider = None;
    for rule in &contract.evidence_assembly.assembly_rules {
        if rule.merge_strategy == MergeStrategy::GraphConstruction {
            graph = build_graph(rule, &store);
            continue;
        }
        match merge_rule(rule, &store) {
            Ok(value) => {
                if rule.target == "raw_score" {
                    raw_score_provider = rule.sources.first().and_then(|source| {
                        bindings
                            .iter()
                            .find(|b| &b.provides == source)
                            .map(|b| (b.class_name.clone(), b.method_name.clone()))
                    });
                }
                assembled.insert(rule.target.clone(), value);
            }
            Err(e) => {
                return failed_outcome(task.question_id, trace, e);
            }
        }
    }

    // Relationship inference and belief propagation.
    let inferred = infer_relations(&mut graph);
    let propagation = propagate_beliefs(&mut graph);

    // Confidence summary per fact kind.
    let mut confidence_scores: BTreeMap<String, f64> = BTreeMap::new();
    let mut per_kind: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for index in graph.nodes() {
        if let Some(fact) = graph.fact(index) {
            let entry = per_kind.entry(fact.kind.clone()).or_insert((0.0, 0));
            entry.0 += fact.confidence;
            entry.1 += 1;
        }
    }
    for (kind, (sum, count)) in per_kind {
        #[allow(clippy::cast_precision_loss)]
        confidence_scores.insert(kind, sum / count as f64);
    }
    confidence_scores.insert("overall".to_string(), graph.mean_confidence());

    // Validation.
    let validation = validate_evidence(&contract.validation_rules, |field| {
        assembled.get(field).cloned()
    });
    trace.validation_failures = validation.trace_lines();

    // Raw score and signal usage provenance.
    let raw_score = assembled
        .get("raw_score")
        .and_then(MethodValue::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    trace.used_signals = store
        .get("scoring.raw")
        .and_then(|v| v.field("signal_hits"))
        .and_then(MethodValue::as_list)
        .map(|hits| {
            hits.iter()
                .filter_map(|h| h.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut metadata: BTreeMap<String, MethodValue> = BTreeMap::new();
    if let Some(components) = store.get("scoring.raw").and_then(|v| v.field("components")) {
        metadata.insert("score_components".to_string(), components.clone());
    }
    #[allow(clippy::cast_possible_wrap)]
    metadata.insert(
        "relations_inferred".to_string(),
        MethodValue::Integer(inferred as i64),
    );
    #[allow(clippy::cast_possible_wrap)]
    metadata.insert(
        "propagation_iterations".to_string(),
        MethodValue::Integer(propagation.iterations as i64),
    );
    metadata.insert(
        "propagation_converged".to_string(),
        MethodValue::Boolean(propagation.converged),
    );

    let evidence = AssembledEvidence {
        elements_found: assembled
            .remove("elements_found")
            .unwrap_or(MethodValue::List(vec![])),
        pattern_matches: assembled
            .remove("pattern_matches")
            .unwrap_or(MethodValue::List(vec![])),
        confidence_scores,
        metadata,
        graph_digest: graph.digest(),
    };

    // abort_on_critical: a critical validation failure aborts the
    // question, never the plan.
    let aborted = validation.has_critical()
        && contract.evidence_assembly.na_policy == "abort_on_critical";
    if aborted {
        debug!(question = %task.question_id, "question aborted on critical validation failure");
    }

    QuestionOutcome {
        question_id: task.question_id,
        raw_score: if aborted { 0.0 } else { raw_score },
        raw_score_provider,
        evidence,
        validation,
        trace,
        aborted,
    }
}

/// Terminal outcome for a question whose pipeline failed twice.
fn failed_outcome(
    question_id: QuestionId,
    mut trace: ExecutionTrace,
    error: MethodError,
) -> QuestionOutcome {
    let failure = format!("CRITICAL: method pipeline: {error}");
    warn!(question = %question_id, error = %error, "question failed");
    trace.validation_failures.push(failure.clone());
    QuestionOutcome {
        question_id,
        raw_score: 0.0,
        raw_score_provider: None,
        evidence: AssembledEvidence::empty(),
        validation: ValidationOutcome {
            failures: vec![crate::evidence::validation::ValidationFailure {
                field: "method_pipeline".to_string(),
                severity: crate::contract::schema::Severity::Critical,
                message: error.to_string(),
            }],
        },
        trace,
        aborted: true,
    }
}
