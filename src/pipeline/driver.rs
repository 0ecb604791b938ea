//! Pipeline driver (C11).
//!
//! Sequences phases 0, 1, 2.1, 2.2, 4–7, 9 and 10, owning the
//! cross-cutting concerns: instrumentation, the adaptive worker pool, the
//! abort signal, per-phase timeouts and post-run metrics persistence.

use crate::aggregation::aggregate_all;
use crate::calibration::policy::CalibrationPolicy;
use crate::config::gates::{BootState, CollaboratorCheck, run_admission};
use crate::config::runtime::RuntimeConfig;
use crate::config::seeds::SeedRegistry;
use crate::contract::catalog::all_contracts;
use crate::contract::registry::ContractRegistry;
use crate::contract::schema::Contract;
use crate::core::matrix::ChunkMatrix;
use crate::core::scores::ScoredMicroQuestion;
use crate::core::thresholds::QualityLevel;
use crate::error::{Error, Result};
use crate::evidence::nexus::execute_question;
use crate::hashing::file_sha256;
use crate::ingest::IngestionProvider;
use crate::io::artifacts::ArtifactWriter;
use crate::methods::executor::MethodExecutor;
use crate::pipeline::abort::AbortSignal;
use crate::pipeline::instrumentation::{PhaseMetrics, PhaseRecorder};
use crate::pipeline::resources::ResourceSampler;
use crate::plan::orchestrator::build_plan;
use crate::questionnaire::Questionnaire;
use crate::report::assembler::AnalysisReport;
use crate::report::html::{PdfRenderer, render_html};
use crate::report::manifest::{
    ManifestTimestamps, RunManifest, SHAPE_CLASSIFICATION_RULE, VerificationManifest,
};
use crate::report::markdown::render_markdown;
use crate::report::{render_cluster_comparison, render_score_distribution};
use crate::signal::registry::SignalRegistry;
use crate::synthesis::render_narrative;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Declared per-phase timeouts.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTimeouts {
    /// Phase 0 (gates and registry loads).
    pub phase0: Duration,
    /// Phase 1 (ingestion and chunk matrix).
    pub phase1: Duration,
    /// Phase 2 (plan build and per-question execution).
    pub phase2: Duration,
    /// Phases 4–7 (aggregation).
    pub aggregation: Duration,
    /// Phases 9–10 (report and manifests).
    pub report: Duration,
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        Self {
            phase0: Duration::from_secs(60),
            phase1: Duration::from_secs(120),
            phase2: Duration::from_secs(600),
            aggregation: Duration::from_secs(120),
            report: Duration::from_secs(180),
        }
    }
}

/// Everything a run needs beyond the runtime config.
pub struct RunRequest<'a> {
    /// The plan document.
    pub plan_path: &'a Path,

    /// The questionnaire monolith file.
    pub questionnaire_path: &'a Path,

    /// Directory of per-question contracts; the built-in catalog backs
    /// DEV runs when absent.
    pub contracts_dir: Option<&'a Path>,

    /// Directory of signal packs; the built-in packs back DEV runs when
    /// absent.
    pub signal_packs_dir: Option<&'a Path>,

    /// The ingestion collaborator.
    pub provider: &'a dyn IngestionProvider,

    /// Optional PDF renderer; absence is a warning, not an error.
    pub pdf_renderer: Option<&'a dyn PdfRenderer>,
}

/// End-of-run summary handed to the CLI.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    /// Plan id of the run.
    pub plan_id: String,

    /// Report id of the run.
    pub report_id: String,

    /// Macro score on `[0, 3]`.
    pub macro_score: f64,

    /// Macro quality label.
    pub macro_quality: QualityLevel,

    /// Cluster scores, in cluster order.
    pub cluster_scores: Vec<(String, f64)>,

    /// Aggregation warnings surfaced to the manifest.
    pub warnings: usize,

    /// Per-question failures (scored INSUFICIENTE at 0).
    pub failed_questions: usize,

    /// Where the artifacts were written.
    pub artifacts_dir: PathBuf,
}

/// The top-level phase sequencer.
pub struct PipelineDriver {
    config: RuntimeConfig,
    timeouts: PhaseTimeouts,
    abort: Arc<AbortSignal>,
    sampler: ResourceSampler,
}

impl PipelineDriver {
    /// Creates a driver over a bootstrapped runtime config.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            timeouts: PhaseTimeouts::default(),
            abort: Arc::new(AbortSignal::new()),
            sampler: ResourceSampler::new(),
        }
    }

    /// Overrides the phase timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: PhaseTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The abort signal, for external cancellation.
    #[must_use]
    pub fn abort_signal(&self) -> Arc<AbortSignal> {
        Arc::clone(&self.abort)
    }

    fn check_phase_timeout(&self, recorder: &PhaseRecorder, phase: &str, limit: Duration) {
        if recorder.elapsed() > limit {
            self.abort.trigger(&format!("timeout_{phase}"));
        }
    }

    fn abort_error(&self) -> Error {
        Error::Aborted {
            reason: self
                .abort
                .reason()
                .map_or_else(|| "unknown".to_string(), |r| r.reason),
        }
    }

    /// Runs the full pipeline.
    ///
    /// # Errors
    ///
    /// Propagates phase errors per the error-handling design; the
    /// verification manifest is written before any early return.
    #[allow(clippy::too_many_lines)]
    pub fn run(&self, request: &RunRequest<'_>) -> Result<RunSummary> {
        let writer = ArtifactWriter::new(&self.config.artifacts_dir);
        let mut verification = VerificationManifest {
            correlation_id: self.config.correlation_id.clone(),
            mode: self.config.mode.to_string(),
            ..VerificationManifest::default()
        };
        let mut phase_metrics: Vec<PhaseMetrics> = Vec::new();
        let mut latency_artifact: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        // ---- Phase 0: bootstrap, input verification, boot checks,
        // determinism, registries.
        let p0 = PhaseRecorder::start("phase0_gates", 4);
        self.sampler.sample();

        let input_pdf_sha256 = file_sha256(request.plan_path)?;
        let questionnaire_sha256 = file_sha256(request.questionnaire_path)?;
        verification.input_pdf_sha256 = Some(input_pdf_sha256.clone());
        verification.questionnaire_sha256 = Some(questionnaire_sha256.clone());

        let questionnaire = Questionnaire::load(request.questionnaire_path)?;

        let mut seeds = SeedRegistry::new();
        seeds.derive_all(&input_pdf_sha256);
        seeds.apply();
        verification.seeds = seeds.snapshot();

        let boot_state = BootState {
            mode: self.config.mode,
            config_ready: true,
            seed_registry_ready: true,
            artifact_root_ready: self.config.artifacts_dir.is_dir(),
            input_pdf_sha256: Some(input_pdf_sha256.clone()),
            questionnaire_sha256: Some(questionnaire_sha256.clone()),
            collaborators: vec![
                CollaboratorCheck {
                    name: "ingestion".to_string(),
                    mandatory: true,
                    present: true,
                    version: Some(request.provider.name().to_string()),
                },
                CollaboratorCheck {
                    name: "pattern_matcher".to_string(),
                    mandatory: true,
                    present: true,
                    version: Some("regex".to_string()),
                },
                CollaboratorCheck {
                    name: "readability".to_string(),
                    mandatory: true,
                    present: true,
                    version: Some("fernandez_huerta".to_string()),
                },
                CollaboratorCheck {
                    name: "pdf_renderer".to_string(),
                    mandatory: false,
                    present: request.pdf_renderer.is_some(),
                    version: None,
                },
            ],
            seeds: seeds.snapshot(),
        };
        let (gate_results, admission) = run_admission(&boot_state);
        verification.gates = gate_results;
        if let Err(e) = admission {
            verification.errors.push(e.to_string());
            writer.write_json("verification_manifest.json", &verification)?;
            phase_metrics.push(p0.finish(verification.gates.len()));
            self.persist_metrics(&writer, &phase_metrics, &latency_artifact)?;
            return Err(e);
        }

        let contracts = match request.contracts_dir {
            Some(dir) => ContractRegistry::load_dir(dir, self.config.mode),
            None => ContractRegistry::from_contracts(all_contracts(), self.config.mode),
        };
        let contracts = match contracts {
            Ok(c) => c,
            Err(e) => {
                verification.errors.push(e.to_string());
                writer.write_json("verification_manifest.json", &verification)?;
                return Err(e);
            }
        };
        let signals = match request.signal_packs_dir {
            Some(dir) => SignalRegistry::load_dir(dir)?,
            None => SignalRegistry::default_registry(),
        };
        self.check_phase_timeout(&p0, "phase0_gates", self.timeouts.phase0);
        phase_metrics.push(p0.finish(4));
        if self.abort.is_aborted() {
            verification.abort = self.abort.reason();
            writer.write_json("verification_manifest.json", &verification)?;
            return Err(self.abort_error());
        }

        // ---- Phase 1: ingestion into the chunk matrix.
        let p1 = PhaseRecorder::start("phase1_ingestion", 60);
        let chunks = request.provider.ingest(request.plan_path, &questionnaire)?;
        let chunk_count = chunks.len();
        let matrix = match ChunkMatrix::from_chunks(chunks) {
            Ok(m) => m,
            Err(e) => {
                verification.errors.push(e.to_string());
                writer.write_json("verification_manifest.json", &verification)?;
                return Err(e);
            }
        };
        self.check_phase_timeout(&p1, "phase1_ingestion", self.timeouts.phase1);
        phase_metrics.push(p1.finish(chunk_count));

        // ---- Phase 2.1: plan build.
        let p21 = PhaseRecorder::start("phase2_plan_build", 300);
        let matrix_chunks: Vec<crate::core::chunk::Chunk> = matrix.iter().cloned().collect();
        let (plan_report, plan) = build_plan(
            &questionnaire,
            &contracts,
            &matrix_chunks,
            &signals,
            self.config.mode,
            &self.config.correlation_id,
        );
        verification.plan_build = Some(plan_report);
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => {
                verification.errors.push(e.to_string());
                writer.write_json("verification_manifest.json", &verification)?;
                phase_metrics.push(p21.finish(0));
                self.persist_metrics(&writer, &phase_metrics, &latency_artifact)?;
                return Err(e);
            }
        };
        verification.plan_id = Some(plan.plan_id.clone());
        writer.write_json(
            "execution_plan.json",
            &serde_json::json!({
                "plan_id": plan.plan_id,
                "integrity_hash": plan.integrity_hash,
                "correlation_id": plan.correlation_id,
                "created_at": plan.created_at,
                "tasks": plan.projections(),
            }),
        )?;
        phase_metrics.push(p21.finish(plan.len()));

        // ---- Phase 2.2: per-question execution on the worker pool.
        let p22 = PhaseRecorder::start("phase2_execution", plan.len());
        self.sampler.sample();
        let workers = self.sampler.recommend_workers(self.config.max_workers);
        info!(workers, "phase 2 worker pool sized");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::InvalidState {
                message: format!("worker pool construction failed: {e}"),
            })?;

        let executor = MethodExecutor::standard();
        let policy = CalibrationPolicy::new(questionnaire.thresholds());
        let numeric_seed = seeds
            .status("numeric_prng")
            .and_then(|s| s.value)
            .unwrap_or_default();

        // DEV fallback: questions without a usable contract run the
        // catalog pipeline their task was irrigated from.
        let fallback: BTreeMap<u16, Contract> = plan
            .tasks()
            .iter()
            .filter(|t| contracts.get(t.question_id).is_err())
            .map(|t| {
                (
                    t.question_id.global(),
                    crate::contract::catalog::contract_for(t.question_id),
                )
            })
            .collect();

        let results: Vec<Option<(ScoredMicroQuestion, String)>> = pool.install(|| {
            plan.tasks()
                .par_iter()
                .map(|task| {
                    if self.abort.is_aborted() {
                        return None;
                    }
                    if p22.elapsed() > self.timeouts.phase2 {
                        self.abort.trigger("timeout_phase2_execution");
                        return None;
                    }
                    let item_started = std::time::Instant::now();

                    let contract = contracts
                        .get(task.question_id)
                        .ok()
                        .or_else(|| fallback.get(&task.question_id.global()))?;
                    let outcome = execute_question(task, contract, &executor);
                    let calibration_seed =
                        numeric_seed.wrapping_add(u64::from(task.question_id.global()));
                    let provider = outcome
                        .raw_score_provider
                        .as_ref()
                        .map(|(c, m)| (c.as_str(), m.as_str()));
                    let calibrated = policy
                        .calibrate(
                            &executor,
                            provider,
                            outcome.raw_score,
                            Some(task.question_id),
                            calibration_seed,
                        )
                        .ok()?;

                    let narrative = render_narrative(
                        &contract.question_context.question_text,
                        &outcome.evidence,
                        &outcome.validation,
                        &calibrated,
                    );
                    let score = calibrated.calibrated_score.clamp(0.0, 1.0);
                    let scored = ScoredMicroQuestion {
                        question_id: task.question_id,
                        policy_area: task.policy_area,
                        dimension: task.dimension,
                        score,
                        normalized_score: score * 3.0,
                        quality_level: if outcome.aborted {
                            QualityLevel::Insuficiente
                        } else {
                            calibrated.label
                        },
                        confidence_interval_95: calibrated.credible_interval_95,
                        evidence_digest: outcome.evidence.graph_digest.clone(),
                        trace: outcome.trace.clone(),
                    };
                    p22.latency
                        .record(item_started.elapsed().as_secs_f64() * 1000.0);
                    Some((scored, narrative))
                })
                .collect()
        });

        if self.abort.is_aborted() {
            verification.abort = self.abort.reason();
            verification
                .errors
                .push("phase 2 aborted; in-flight results discarded".to_string());
            writer.write_json("verification_manifest.json", &verification)?;
            phase_metrics.push(p22.finish(0));
            self.persist_metrics(&writer, &phase_metrics, &latency_artifact)?;
            return Err(self.abort_error());
        }

        let mut scored = Vec::with_capacity(plan.len());
        let mut narratives = Vec::with_capacity(plan.len());
        for result in results.into_iter().flatten() {
            scored.push(result.0);
            narratives.push(result.1);
        }
        let failed_questions = scored
            .iter()
            .filter(|s| s.quality_level == QualityLevel::Insuficiente && s.score == 0.0)
            .count();
        latency_artifact.insert("phase2_execution".to_string(), p22.latency.samples());
        phase_metrics.push(p22.finish(scored.len()));
        writer.write_jsonl("scored_micro.jsonl", &scored)?;
        policy
            .audit()
            .write_jsonl(&writer.root().join("calibration_audit.jsonl"))?;
        writer.record_external("calibration_audit.jsonl")?;

        // ---- Phases 4–7: aggregation.
        let p47 = PhaseRecorder::start("phase4_7_aggregation", scored.len());
        let aggregation = aggregate_all(&scored, &questionnaire, Some(numeric_seed))?;
        for violation in &aggregation.violations {
            p47.warn(format!(
                "{} at {}: {}",
                violation.invariant, violation.level, violation.message
            ));
        }
        writer.write_json("dimension_scores.json", &aggregation.dimension_scores)?;
        writer.write_json("area_scores.json", &aggregation.area_scores)?;
        writer.write_json("cluster_scores.json", &aggregation.cluster_scores)?;
        writer.write_json("macro_score.json", &aggregation.macro_score)?;
        self.check_phase_timeout(&p47, "phase4_7_aggregation", self.timeouts.aggregation);
        phase_metrics.push(p47.finish(scored.len()));

        // ---- Phases 9–10: report, charts and manifests.
        let p9 = PhaseRecorder::start("phase9_10_report", 5);
        let report = AnalysisReport::assemble(
            &self.config.correlation_id,
            &plan.plan_id,
            aggregation.macro_score.clone(),
            aggregation.cluster_scores.clone(),
            aggregation.area_scores.clone(),
            aggregation.dimension_scores.clone(),
            &scored,
            &narratives,
        );
        report.validate()?;

        writer.write_text("plan_report.md", &render_markdown(&report))?;
        writer.write_text("plan_report.html", &render_html(&report)?)?;
        match request.pdf_renderer {
            Some(renderer) => {
                let pdf = renderer.render(&render_html(&report)?)?;
                writer.write_bytes("plan_report.pdf", &pdf)?;
            }
            None => {
                p9.warn("no PDF renderer available; skipping plan_report.pdf".to_string());
                warn!("no PDF renderer available; skipping plan_report.pdf");
            }
        }

        render_score_distribution(
            &report.micro,
            &writer.root().join("score_distribution.png"),
        )?;
        writer.record_external("score_distribution.png")?;
        render_cluster_comparison(
            &report.cluster_scores,
            &writer.root().join("cluster_comparison.png"),
        )?;
        writer.record_external("cluster_comparison.png")?;

        // Metrics artifacts participate in the final manifest hash set.
        self.check_phase_timeout(&p9, "phase9_10_report", self.timeouts.report);
        phase_metrics.push(p9.finish(5));
        self.persist_metrics(&writer, &phase_metrics, &latency_artifact)?;
        writer.write_json("verification_manifest.json", &verification)?;

        let manifest = RunManifest {
            report_id: report.report_id.clone(),
            plan_id: plan.plan_id.clone(),
            correlation_id: self.config.correlation_id.clone(),
            input_pdf_sha256,
            questionnaire_sha256,
            artifacts: writer.hashes(),
            evidence_chain_hash: report.evidence_chain_hash(),
            shape_classification_rule: SHAPE_CLASSIFICATION_RULE.to_string(),
            timestamps: ManifestTimestamps {
                generated_at: report.generated_at,
                plan_created_at: plan.created_at,
            },
        };
        writer.write_json("manifest.json", &manifest)?;

        let warnings = aggregation.violations.len();
        info!(
            macro_score = aggregation.macro_score.score,
            warnings, failed_questions, "run complete"
        );
        Ok(RunSummary {
            plan_id: plan.plan_id,
            report_id: report.report_id,
            macro_score: aggregation.macro_score.score,
            macro_quality: aggregation.macro_score.quality_level,
            cluster_scores: aggregation
                .cluster_scores
                .iter()
                .map(|c| (c.cluster.to_string(), c.score))
                .collect(),
            warnings,
            failed_questions,
            artifacts_dir: self.config.artifacts_dir.clone(),
        })
    }

    fn persist_metrics(
        &self,
        writer: &ArtifactWriter,
        phase_metrics: &[PhaseMetrics],
        latency: &BTreeMap<String, Vec<f64>>,
    ) -> Result<()> {
        writer.write_json("phase_metrics.json", &phase_metrics)?;
        writer.write_jsonl("resource_usage.jsonl", &self.sampler.history())?;
        writer.write_json("latency_histograms.json", latency)?;
        Ok(())
    }
}
