//! Irrigation orchestrator (C6).
//!
//! Turns (300 contracts, 60 chunks, 10 signal packs) into one immutable
//! [`ExecutionPlan`] with full provenance. Deterministic: the same inputs
//! always produce the same `plan_id`. Plan construction is a single
//! transaction; any failure discards the plan, while the binding report is
//! still emitted for the verification manifest.

use crate::config::runtime::Mode;
use crate::contract::registry::ContractRegistry;
use crate::core::chunk::Chunk;
use crate::core::ids::{
    CHUNK_COUNT, DIMENSION_COUNT, Dimension, POLICY_AREA_COUNT, PolicyArea, QUESTION_COUNT,
    QUESTIONS_PER_AREA, QUESTIONS_PER_CELL, chunk_id, task_id,
};
use crate::error::{Error, Result, SyncError};
use crate::plan::binding::{BindingStatus, ExecutorChunkBinding};
use crate::plan::task::{ExecutableTask, ExecutionPlan};
use crate::questionnaire::Questionnaire;
use crate::signal::registry::{ResolvedSignals, SignalRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error};

/// Aggregate statistics of a plan build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    /// Tasks emitted.
    pub task_count: usize,

    /// Bindings with status `matched`.
    pub matched: usize,

    /// Distinct chunks referenced by matched bindings.
    pub chunks_used: usize,

    /// Bindings that fell back to monolith patterns (no usable contract).
    pub contract_fallbacks: usize,
}

/// The emitted JOIN-table report (persisted into the verification
/// manifest).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanBuildReport {
    /// All 300 binding rows, in question order.
    pub bindings: Vec<ExecutorChunkBinding>,

    /// Per-invariant pass/fail flags.
    pub invariants: BTreeMap<String, bool>,

    /// Aggregate statistics.
    pub stats: PlanStats,

    /// Errors accumulated during the build.
    pub errors: Vec<String>,
}

/// Builds the execution plan.
///
/// Returns the binding report alongside the plan result so a failed build
/// still surfaces its JOIN table. The report's `bindings` array always has
/// one row per question.
#[allow(clippy::too_many_lines)]
pub fn build_plan(
    questionnaire: &Questionnaire,
    contracts: &ContractRegistry,
    chunks: &[Chunk],
    signals: &SignalRegistry,
    mode: Mode,
    correlation_id: &str,
) -> (PlanBuildReport, Result<ExecutionPlan>) {
    let mut report = PlanBuildReport::default();
    let mut first_error: Option<Error> = None;
    let mut record_error = |report: &mut PlanBuildReport, slot: &mut Option<Error>, e: Error| {
        report.errors.push(e.to_string());
        if slot.is_none() {
            *slot = Some(e);
        }
    };

    // Sub-phase 1: monolith counts. The questionnaire type guarantees its
    // own layout; chunk and contract counts are checked here.
    if chunks.len() != CHUNK_COUNT {
        record_error(
            &mut report,
            &mut first_error,
            SyncError::MonolithCounts {
                reason: format!("expected {CHUNK_COUNT} chunks, got {}", chunks.len()),
            }
            .into(),
        );
    }
    if mode.is_strict() && contracts.len() != QUESTION_COUNT {
        record_error(
            &mut report,
            &mut first_error,
            SyncError::MonolithCounts {
                reason: format!("expected {QUESTION_COUNT} contracts, got {}", contracts.len()),
            }
            .into(),
        );
    }

    // Chunk lookup with duplicate detection.
    let mut chunk_map: BTreeMap<(PolicyArea, Dimension), &Chunk> = BTreeMap::new();
    let mut duplicate_cells: BTreeSet<(PolicyArea, Dimension)> = BTreeSet::new();
    for chunk in chunks {
        let key = (chunk.policy_area, chunk.dimension);
        if chunk_map.insert(key, chunk).is_some() {
            duplicate_cells.insert(key);
        }
    }

    // Sub-phases 2–6: bind every question.
    let mut tasks: Vec<ExecutableTask> = Vec::with_capacity(QUESTION_COUNT);
    let mut emitted_ids: BTreeSet<String> = BTreeSet::new();
    let mut chunk_usage: BTreeMap<String, usize> = BTreeMap::new();

    for question in questionnaire.questions() {
        let qid = question.question_id;
        let (pa, dim) = (question.policy_area_id, question.dimension_id);
        let cell = (pa, dim);
        let expected_chunk = chunk_id(pa, dim);
        let contract = contracts.get(qid).ok();

        // Sub-phase 4: pattern filtering — contract patterns when
        // available, PA-filtered monolith patterns otherwise.
        let applicable_patterns = contract.map_or_else(
            || {
                questionnaire
                    .patterns_for(pa)
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
            },
            |c| c.question_context.patterns.clone(),
        );
        if contract.is_none() {
            report.stats.contract_fallbacks += 1;
        }
        let expected_patterns: Vec<String> =
            applicable_patterns.iter().map(|p| p.id.clone()).collect();
        let expected_signals: Vec<String> = contract.map_or_else(Vec::new, |c| {
            c.signal_requirements
                .mandatory_signals
                .iter()
                .chain(c.signal_requirements.optional_signals.iter())
                .cloned()
                .collect()
        });

        let mut binding = ExecutorChunkBinding {
            executor_contract_id: qid,
            chunk_id: expected_chunk.clone(),
            expected_patterns,
            expected_signals,
            irrigated_patterns: vec![],
            irrigated_signals: vec![],
            status: BindingStatus::Matched,
        };

        // Sub-phase 2: chunk lookup.
        if duplicate_cells.contains(&cell) {
            binding.status = BindingStatus::DuplicateChunk;
            record_error(
                &mut report,
                &mut first_error,
                SyncError::ChunkMismatch {
                    question_id: qid.to_string(),
                    reason: format!("chunk {expected_chunk} provided more than once"),
                }
                .into(),
            );
            report.bindings.push(binding);
            continue;
        }
        let Some(chunk) = chunk_map.get(&cell) else {
            binding.status = BindingStatus::MissingChunk;
            record_error(
                &mut report,
                &mut first_error,
                SyncError::MissingChunk {
                    question_id: qid.to_string(),
                    chunk_id: expected_chunk,
                }
                .into(),
            );
            report.bindings.push(binding);
            continue;
        };
        if chunk.id() != expected_chunk {
            binding.status = BindingStatus::Mismatch;
            record_error(
                &mut report,
                &mut first_error,
                SyncError::ChunkMismatch {
                    question_id: qid.to_string(),
                    reason: format!("chunk declares {}, binding expects {expected_chunk}", chunk.id()),
                }
                .into(),
            );
            report.bindings.push(binding);
            continue;
        }

        // Sub-phase 5: signal resolution.
        let resolved = match contract {
            Some(c) => match signals.resolve(qid, &c.signal_requirements, mode) {
                Ok(resolved) => resolved,
                Err(e) => {
                    binding.status = BindingStatus::MissingSignals;
                    record_error(&mut report, &mut first_error, e);
                    report.bindings.push(binding);
                    continue;
                }
            },
            None => ResolvedSignals::default(),
        };
        binding.irrigated_patterns.clone_from(&binding.expected_patterns);
        binding.irrigated_signals = resolved.names();

        // Sub-phase 6: task construction with the duplicate hard stop.
        let tid = task_id(qid);
        if !emitted_ids.insert(tid.clone()) {
            let e: Error = SyncError::DuplicateTask { task_id: tid }.into();
            error!(error = %e, "duplicate task id; aborting plan build");
            record_error(&mut report, &mut first_error, e);
            report.bindings.push(binding);
            break;
        }
        *chunk_usage.entry(expected_chunk).or_insert(0) += 1;

        tasks.push(ExecutableTask {
            task_id: tid,
            question_id: qid,
            policy_area: pa,
            dimension: dim,
            chunk_id: binding.chunk_id.clone(),
            chunk_text: chunk.text.clone(),
            applicable_patterns,
            resolved_signals: resolved,
            expected_elements: contract
                .map_or_else(Vec::new, |c| c.question_context.expected_elements.clone()),
        });
        report.bindings.push(binding);
    }

    // Sub-phase 7: cross-task cardinality.
    let matched = report
        .bindings
        .iter()
        .filter(|b| b.status == BindingStatus::Matched)
        .count();
    let per_chunk_ok = chunk_usage.len() == CHUNK_COUNT
        && chunk_usage.values().all(|n| *n == QUESTIONS_PER_CELL);
    let mut per_area: BTreeMap<PolicyArea, usize> = BTreeMap::new();
    let mut per_dimension: BTreeMap<Dimension, usize> = BTreeMap::new();
    for task in &tasks {
        *per_area.entry(task.policy_area).or_insert(0) += 1;
        *per_dimension.entry(task.dimension).or_insert(0) += 1;
    }
    let per_area_ok = per_area.len() == POLICY_AREA_COUNT
        && per_area.values().all(|n| *n == QUESTIONS_PER_AREA);
    let per_dimension_ok = per_dimension.len() == DIMENSION_COUNT
        && per_dimension
            .values()
            .all(|n| *n == QUESTION_COUNT / DIMENSION_COUNT);

    if first_error.is_none() && !(per_chunk_ok && per_area_ok && per_dimension_ok) {
        record_error(
            &mut report,
            &mut first_error,
            SyncError::Cardinality {
                reason: format!(
                    "per_chunk_ok={per_chunk_ok} per_area_ok={per_area_ok} per_dimension_ok={per_dimension_ok}"
                ),
            }
            .into(),
        );
    }

    report.stats.task_count = tasks.len();
    report.stats.matched = matched;
    report.stats.chunks_used = chunk_usage.len();

    report.invariants.insert(
        "all_bindings_matched".to_string(),
        matched == QUESTION_COUNT,
    );
    report
        .invariants
        .insert("task_count_300".to_string(), tasks.len() == QUESTION_COUNT);
    report
        .invariants
        .insert("unique_task_ids".to_string(), emitted_ids.len() == tasks.len());
    report
        .invariants
        .insert("chunk_usage_5_per_chunk".to_string(), per_chunk_ok);
    report.invariants.insert("per_area_30".to_string(), per_area_ok);
    report
        .invariants
        .insert("per_dimension_50".to_string(), per_dimension_ok);

    // Sub-phase 8: emit. Abort-on-any-failure keeps the build transactional.
    if let Some(e) = first_error {
        return (report, Err(e));
    }

    debug!(tasks = tasks.len(), "plan build complete");
    let plan = ExecutionPlan::assemble(tasks, correlation_id.to_string());
    (report, plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::catalog::all_contracts;
    use crate::core::ids::QuestionId;

    fn full_chunks() -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for pa in PolicyArea::ALL {
            for dim in Dimension::ALL {
                chunks.push(Chunk::new(
                    pa,
                    dim,
                    format!("Texto del plan para {pa} {dim} con objetivo y meta al 80% en 2027."),
                ));
            }
        }
        chunks
    }

    fn registry() -> ContractRegistry {
        ContractRegistry::from_contracts(all_contracts(), Mode::Prod).unwrap()
    }

    fn questionnaire() -> Questionnaire {
        Questionnaire::new(
            crate::questionnaire::layout_questions(),
            crate::core::thresholds::ScoreThresholds::new(0.85, 0.70, 0.55).unwrap(),
            crate::questionnaire::default_clusters(),
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_full_build_succeeds() {
        let (report, plan) = build_plan(
            &questionnaire(),
            &registry(),
            &full_chunks(),
            &SignalRegistry::default_registry(),
            Mode::Prod,
            "corr",
        );
        let plan = plan.unwrap();
        assert_eq!(plan.len(), 300);
        assert_eq!(report.bindings.len(), 300);
        assert!(report.invariants.values().all(|v| *v));
        assert_eq!(report.stats.matched, 300);
        assert_eq!(report.stats.chunks_used, 60);
        assert!(report.errors.is_empty());

        // Every task id unique, every chunk used five times.
        let ids: BTreeSet<&str> = plan.tasks().iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids.len(), 300);
    }

    #[test]
    fn test_determinism_of_plan_id() {
        let run = || {
            build_plan(
                &questionnaire(),
                &registry(),
                &full_chunks(),
                &SignalRegistry::default_registry(),
                Mode::Prod,
                "corr",
            )
            .1
            .unwrap()
            .plan_id
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_missing_chunk_aborts_with_binding() {
        let mut chunks = full_chunks();
        chunks.retain(|c| !(c.policy_area == PolicyArea::Pa03 && c.dimension == Dimension::Dim02));
        let (report, plan) = build_plan(
            &questionnaire(),
            &registry(),
            &chunks,
            &SignalRegistry::default_registry(),
            Mode::Prod,
            "corr",
        );
        let err = plan.unwrap_err();
        assert_eq!(err.exit_code(), 13);
        let missing: Vec<_> = report
            .bindings
            .iter()
            .filter(|b| b.status == BindingStatus::MissingChunk)
            .collect();
        assert!(!missing.is_empty());
        assert!(missing.iter().all(|b| b.chunk_id == "PA03-DIM02"));
        assert_eq!(report.invariants.get("all_bindings_matched"), Some(&false));
    }

    #[test]
    fn test_duplicate_chunk_aborts() {
        let mut chunks = full_chunks();
        chunks.push(Chunk::new(
            PolicyArea::Pa01,
            Dimension::Dim01,
            "texto duplicado".to_string(),
        ));
        let (report, plan) = build_plan(
            &questionnaire(),
            &registry(),
            &chunks,
            &SignalRegistry::default_registry(),
            Mode::Prod,
            "corr",
        );
        assert!(plan.is_err());
        assert!(
            report
                .bindings
                .iter()
                .any(|b| b.status == BindingStatus::DuplicateChunk)
        );
    }

    #[test]
    fn test_bindings_carry_irrigation_provenance() {
        let (report, plan) = build_plan(
            &questionnaire(),
            &registry(),
            &full_chunks(),
            &SignalRegistry::default_registry(),
            Mode::Prod,
            "corr",
        );
        plan.unwrap();
        let binding = &report.bindings[0];
        assert_eq!(binding.executor_contract_id, QuestionId::new(1).unwrap());
        assert!(!binding.expected_patterns.is_empty());
        assert_eq!(binding.irrigated_patterns, binding.expected_patterns);
        assert_eq!(
            binding.irrigated_signals,
            vec!["nucleo_dim1".to_string(), "contexto_pa".to_string()]
        );
        assert_eq!(binding.status, BindingStatus::Matched);
    }

    #[test]
    fn test_missing_contracts_fatal_in_prod() {
        let mut contracts = all_contracts();
        contracts[0].signal_requirements.minimum_signal_threshold = 0.0;
        contracts[0] = contracts[0].clone().seal().unwrap();
        // Dev registry tolerates the defect, leaving 299 usable contracts.
        let registry = ContractRegistry::from_contracts(contracts, Mode::Dev).unwrap();
        let (_, plan) = build_plan(
            &questionnaire(),
            &registry,
            &full_chunks(),
            &SignalRegistry::default_registry(),
            Mode::Prod,
            "corr",
        );
        assert!(plan.is_err());
    }

    #[test]
    fn test_dev_fallback_to_monolith_patterns() {
        let mut contracts = all_contracts();
        contracts[0].signal_requirements.minimum_signal_threshold = 0.0;
        contracts[0] = contracts[0].clone().seal().unwrap();
        let registry = ContractRegistry::from_contracts(contracts, Mode::Dev).unwrap();

        let questionnaire = Questionnaire::new(
            crate::questionnaire::layout_questions(),
            crate::core::thresholds::ScoreThresholds::new(0.85, 0.70, 0.55).unwrap(),
            crate::questionnaire::default_clusters(),
            vec![crate::questionnaire::PatternSpec {
                id: "fallback".to_string(),
                pattern_type: "strategic".to_string(),
                regex: "objetivo".to_string(),
                weight: 1.0,
                policy_area: None,
            }],
        )
        .unwrap();

        let (report, plan) = build_plan(
            &questionnaire,
            &registry,
            &full_chunks(),
            &SignalRegistry::default_registry(),
            Mode::Dev,
            "corr",
        );
        let plan = plan.unwrap();
        assert_eq!(plan.len(), 300);
        assert_eq!(report.stats.contract_fallbacks, 1);
        assert_eq!(report.bindings[0].expected_patterns, vec!["fallback"]);
    }
}
