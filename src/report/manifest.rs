//! Run manifests.
//!
//! `verification_manifest.json` captures the Phase-0 gate results, the
//! JOIN-table bindings and the seed snapshot; `manifest.json` seals the
//! run with the hash of every emitted artifact. Timestamps are collected
//! into one isolated block so everything else compares byte-for-byte
//! across re-runs.

use crate::config::gates::GateResult;
use crate::config::seeds::SeedStatus;
use crate::hashing::sha256_hex;
use crate::pipeline::abort::AbortReason;
use crate::plan::orchestrator::PlanBuildReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The shape-classification rule in force, recorded per the open design
/// decision.
pub const SHAPE_CLASSIFICATION_RULE: &str = "cv<0.15 uniform; cv<0.40 clustered; cv>=0.40 \
     dispersed, refined to bimodal when members form >=3 distinct levels and the largest \
     adjacent gap exceeds 60% of the range";

/// Phase-0 and JOIN-table verification manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationManifest {
    /// Correlation id of the run.
    pub correlation_id: String,

    /// Runtime mode.
    pub mode: String,

    /// Gate results in fail-fast order (stops at the first failure).
    pub gates: Vec<GateResult>,

    /// Seed snapshot after derivation and apply.
    pub seeds: Vec<SeedStatus>,

    /// SHA-256 of the input plan document, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_pdf_sha256: Option<String>,

    /// SHA-256 of the questionnaire monolith, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questionnaire_sha256: Option<String>,

    /// JOIN-table build report, once plan construction ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_build: Option<PlanBuildReport>,

    /// Plan id, once the plan assembled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    /// Abort reason, when the run aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortReason>,

    /// Run-level error summary.
    pub errors: Vec<String>,
}

/// Timestamps of a run, isolated from the deterministic body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestTimestamps {
    /// When the manifest was generated.
    pub generated_at: DateTime<Utc>,

    /// When the execution plan was created.
    pub plan_created_at: DateTime<Utc>,
}

/// The final sealed manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Report identifier.
    pub report_id: String,

    /// Plan identifier.
    pub plan_id: String,

    /// Correlation id.
    pub correlation_id: String,

    /// SHA-256 of the input plan document.
    pub input_pdf_sha256: String,

    /// SHA-256 of the questionnaire monolith.
    pub questionnaire_sha256: String,

    /// SHA-256 of every emitted artifact, keyed by file name.
    pub artifacts: BTreeMap<String, String>,

    /// SHA-256 over the concatenated sorted evidence digests.
    pub evidence_chain_hash: String,

    /// The shape-classification rule in force.
    pub shape_classification_rule: String,

    /// Isolated timestamp block.
    pub timestamps: ManifestTimestamps,
}

impl RunManifest {
    /// Hash of the manifest body with the timestamp block zeroed out,
    /// used by idempotence checks.
    #[must_use]
    pub fn stable_digest(&self) -> String {
        let mut stable = self.clone();
        stable.timestamps = ManifestTimestamps {
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
            plan_created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        crate::hashing::canonical_sha256(&stable)
            .unwrap_or_else(|_| sha256_hex(self.report_id.as_bytes()))
    }
}
