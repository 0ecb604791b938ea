//! The four-gate admission protocol (Phase 0).
//!
//! Gates run fail-fast in a fixed order before any downstream work:
//! bootstrap, input verification, boot checks, determinism. Each gate is a
//! pure check over a [`BootState`] snapshot, so tests can drive any gate in
//! isolation with a hand-built state.

use crate::config::runtime::Mode;
use crate::config::seeds::SeedStatus;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Outcome of one external-collaborator boot check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorCheck {
    /// Collaborator name (e.g. "ingestion", "pattern_matcher").
    pub name: String,

    /// Whether the collaborator must be present in every mode.
    pub mandatory: bool,

    /// Whether the collaborator was found.
    pub present: bool,

    /// Reported version, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Snapshot of everything the admission gates inspect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootState {
    /// Runtime mode.
    pub mode: Mode,

    /// Whether the runtime config was constructed.
    pub config_ready: bool,

    /// Whether the seed registry was constructed.
    pub seed_registry_ready: bool,

    /// Whether the artifacts root exists and is writable.
    pub artifact_root_ready: bool,

    /// SHA-256 of the input plan document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_pdf_sha256: Option<String>,

    /// SHA-256 of the questionnaire monolith.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questionnaire_sha256: Option<String>,

    /// Boot-check results for declared collaborators.
    pub collaborators: Vec<CollaboratorCheck>,

    /// Seed statuses after derivation and apply.
    pub seeds: Vec<SeedStatus>,
}

/// One admission gate.
pub trait Gate {
    /// Stable gate identifier (used in manifests).
    fn id(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Runs the check against a boot-state snapshot.
    ///
    /// # Errors
    ///
    /// Returns the gate-specific [`GateError`] on failure.
    fn check(&self, state: &BootState) -> std::result::Result<(), GateError>;
}

/// Gate 1: config, seed registry and artifact root all initialized.
pub struct BootstrapGate;

impl Gate for BootstrapGate {
    fn id(&self) -> &'static str {
        "G1_BOOTSTRAP"
    }

    fn description(&self) -> &'static str {
        "runtime config, seed registry and artifact root initialized"
    }

    fn check(&self, state: &BootState) -> std::result::Result<(), GateError> {
        let missing = [
            (state.config_ready, "runtime config"),
            (state.seed_registry_ready, "seed registry"),
            (state.artifact_root_ready, "artifact root"),
        ]
        .iter()
        .filter(|(ready, _)| !ready)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GateError::Bootstrap {
                reason: format!("not initialized: {}", missing.join(", ")),
            })
        }
    }
}

/// Gate 2: both input hashes present and non-empty.
pub struct InputVerificationGate;

impl Gate for InputVerificationGate {
    fn id(&self) -> &'static str {
        "G2_INPUT_VERIFICATION"
    }

    fn description(&self) -> &'static str {
        "input document and questionnaire hashes recorded"
    }

    fn check(&self, state: &BootState) -> std::result::Result<(), GateError> {
        for (hash, what) in [
            (&state.input_pdf_sha256, "input document hash"),
            (&state.questionnaire_sha256, "questionnaire hash"),
        ] {
            match hash {
                Some(h) if !h.is_empty() => {}
                _ => {
                    return Err(GateError::InputVerification {
                        reason: format!("{what} missing or empty"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Gate 3: collaborator presence per mode (PROD: all; DEV: mandatory only).
pub struct BootCheckGate;

impl Gate for BootCheckGate {
    fn id(&self) -> &'static str {
        "G3_BOOT_CHECKS"
    }

    fn description(&self) -> &'static str {
        "declared external collaborators present"
    }

    fn check(&self, state: &BootState) -> std::result::Result<(), GateError> {
        for check in &state.collaborators {
            if check.present {
                continue;
            }
            if check.mandatory || state.mode.is_strict() {
                return Err(GateError::BootCheck {
                    missing: check.name.clone(),
                    mode: state.mode.to_string(),
                });
            }
            info!(collaborator = %check.name, "optional collaborator absent in dev mode");
        }
        Ok(())
    }
}

/// Gate 4: mandatory seeds derived and applied.
pub struct DeterminismGate;

impl Gate for DeterminismGate {
    fn id(&self) -> &'static str {
        "G4_DETERMINISM"
    }

    fn description(&self) -> &'static str {
        "mandatory seeds derived and applied"
    }

    fn check(&self, state: &BootState) -> std::result::Result<(), GateError> {
        for seed in state.seeds.iter().filter(|s| s.mandatory) {
            if seed.value.is_none() {
                return Err(GateError::Determinism {
                    seed: seed.name.clone(),
                    problem: "missing".to_string(),
                });
            }
            if !seed.applied {
                return Err(GateError::Determinism {
                    seed: seed.name.clone(),
                    problem: "not applied".to_string(),
                });
            }
        }
        if !state.seeds.iter().any(|s| s.mandatory) {
            return Err(GateError::Determinism {
                seed: "core_prng".to_string(),
                problem: "missing".to_string(),
            });
        }
        Ok(())
    }
}

/// Serializable result of one gate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Gate identifier.
    pub gate_id: String,

    /// Whether the gate passed.
    pub passed: bool,

    /// Error text for a failed gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The admission gates in their fail-fast order.
#[must_use]
pub fn admission_gates() -> Vec<Box<dyn Gate>> {
    vec![
        Box::new(BootstrapGate),
        Box::new(InputVerificationGate),
        Box::new(BootCheckGate),
        Box::new(DeterminismGate),
    ]
}

/// Runs the admission gates fail-fast.
///
/// Gates after the first failure are not run (and not reported); the
/// caller persists the results into `verification_manifest.json`.
///
/// # Errors
///
/// Returns the first failing gate's error alongside the partial results
/// via the `results` out-parameter pattern below.
pub fn run_admission(state: &BootState) -> (Vec<GateResult>, Result<()>) {
    let mut results = Vec::new();
    for gate in admission_gates() {
        match gate.check(state) {
            Ok(()) => {
                info!(gate = gate.id(), "gate passed");
                results.push(GateResult {
                    gate_id: gate.id().to_string(),
                    passed: true,
                    error: None,
                });
            }
            Err(e) => {
                error!(gate = gate.id(), error = %e, "gate failed");
                results.push(GateResult {
                    gate_id: gate.id().to_string(),
                    passed: false,
                    error: Some(e.to_string()),
                });
                return (results, Err(e.into()));
            }
        }
    }
    (results, Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_state() -> BootState {
        BootState {
            mode: Mode::Prod,
            config_ready: true,
            seed_registry_ready: true,
            artifact_root_ready: true,
            input_pdf_sha256: Some("a".repeat(64)),
            questionnaire_sha256: Some("b".repeat(64)),
            collaborators: vec![CollaboratorCheck {
                name: "ingestion".to_string(),
                mandatory: true,
                present: true,
                version: Some("1.0".to_string()),
            }],
            seeds: vec![
                SeedStatus {
                    name: "core_prng".to_string(),
                    mandatory: true,
                    value: Some(42),
                    applied: true,
                },
                SeedStatus {
                    name: "numeric_prng".to_string(),
                    mandatory: true,
                    value: Some(43),
                    applied: true,
                },
            ],
        }
    }

    #[test]
    fn test_all_gates_pass_on_ready_state() {
        let (results, outcome) = run_admission(&ready_state());
        assert!(outcome.is_ok());
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn test_bootstrap_gate_failure() {
        let mut state = ready_state();
        state.artifact_root_ready = false;
        let err = BootstrapGate.check(&state).unwrap_err();
        assert_eq!(err.gate_id(), "G1_BOOTSTRAP");
        assert!(err.to_string().contains("artifact root"));
    }

    #[test]
    fn test_input_gate_rejects_empty_hash() {
        let mut state = ready_state();
        state.questionnaire_sha256 = Some(String::new());
        assert!(InputVerificationGate.check(&state).is_err());

        state.questionnaire_sha256 = None;
        assert!(InputVerificationGate.check(&state).is_err());
    }

    #[test]
    fn test_boot_check_gate_mode_sensitivity() {
        let mut state = ready_state();
        state.collaborators.push(CollaboratorCheck {
            name: "pdf_renderer".to_string(),
            mandatory: false,
            present: false,
            version: None,
        });

        // PROD requires all collaborators.
        assert!(BootCheckGate.check(&state).is_err());

        // DEV tolerates missing optional collaborators.
        state.mode = Mode::Dev;
        assert!(BootCheckGate.check(&state).is_ok());

        // But never missing mandatory ones.
        state.collaborators[0].present = false;
        assert!(BootCheckGate.check(&state).is_err());
    }

    #[test]
    fn test_determinism_gate_requires_applied_seeds() {
        let mut state = ready_state();
        state.seeds[1].applied = false;
        let err = DeterminismGate.check(&state).unwrap_err();
        assert!(err.to_string().contains("numeric_prng"));
        assert!(err.to_string().contains("not applied"));

        state.seeds[1].value = None;
        let err = DeterminismGate.check(&state).unwrap_err();
        assert!(err.to_string().contains("missing"));

        state.seeds.clear();
        assert!(DeterminismGate.check(&state).is_err());
    }

    #[test]
    fn test_fail_fast_stops_at_first_failure() {
        let mut state = ready_state();
        state.config_ready = false;
        state.input_pdf_sha256 = None;
        let (results, outcome) = run_admission(&state);
        assert!(outcome.is_err());
        // Only the bootstrap gate ran.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].gate_id, "G1_BOOTSTRAP");
        assert!(!results[0].passed);
    }

    #[test]
    fn test_gate_order() {
        let ids: Vec<&str> = admission_gates().iter().map(|g| g.id()).collect();
        assert_eq!(
            ids,
            vec![
                "G1_BOOTSTRAP",
                "G2_INPUT_VERIFICATION",
                "G3_BOOT_CHECKS",
                "G4_DETERMINISM"
            ]
        );
    }
}
