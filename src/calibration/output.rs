//! Calibration output types.
//!
//! A calibration converts a raw method score into a quality label with an
//! explicit probability mass over the four labels, a modulated weight and
//! full provenance back to the transformation that produced it.

use crate::core::scores::ConfidenceInterval;
use crate::core::thresholds::QualityLevel;
use crate::error::{Error, Result};
use crate::hashing::canonical_sha256;
use serde::{Deserialize, Serialize};

/// Tolerance for probability-mass normalization.
pub const MASS_TOLERANCE: f64 = 1e-6;

/// Probability distribution over the four quality labels.
///
/// The constructor enforces normalization to 1 within [`MASS_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelProbabilityMass {
    /// P(EXCELENTE).
    pub excelente: f64,
    /// P(BUENO).
    pub bueno: f64,
    /// P(ACEPTABLE).
    pub aceptable: f64,
    /// P(INSUFICIENTE).
    pub insuficiente: f64,
}

impl LabelProbabilityMass {
    /// Builds a mass, enforcing normalization.
    ///
    /// # Errors
    ///
    /// Returns an error when the components do not sum to 1 ± 1e-6 or any
    /// component is negative.
    pub fn new(excelente: f64, bueno: f64, aceptable: f64, insuficiente: f64) -> Result<Self> {
        let components = [excelente, bueno, aceptable, insuficiente];
        if components.iter().any(|p| *p < 0.0) {
            return Err(Error::InvalidState {
                message: "negative label probability".to_string(),
            });
        }
        let sum: f64 = components.iter().sum();
        if (sum - 1.0).abs() > MASS_TOLERANCE {
            return Err(Error::InvalidState {
                message: format!("label probabilities sum to {sum}, expected 1.0"),
            });
        }
        Ok(Self {
            excelente,
            bueno,
            aceptable,
            insuficiente,
        })
    }

    /// A certain mass: all probability on one label.
    #[must_use]
    pub const fn certain(label: QualityLevel) -> Self {
        match label {
            QualityLevel::Excelente => Self {
                excelente: 1.0,
                bueno: 0.0,
                aceptable: 0.0,
                insuficiente: 0.0,
            },
            QualityLevel::Bueno => Self {
                excelente: 0.0,
                bueno: 1.0,
                aceptable: 0.0,
                insuficiente: 0.0,
            },
            QualityLevel::Aceptable => Self {
                excelente: 0.0,
                bueno: 0.0,
                aceptable: 1.0,
                insuficiente: 0.0,
            },
            QualityLevel::Insuficiente => Self {
                excelente: 0.0,
                bueno: 0.0,
                aceptable: 0.0,
                insuficiente: 1.0,
            },
        }
    }

    /// Probability assigned to one label.
    #[must_use]
    pub const fn of(&self, label: QualityLevel) -> f64 {
        match label {
            QualityLevel::Excelente => self.excelente,
            QualityLevel::Bueno => self.bueno,
            QualityLevel::Aceptable => self.aceptable,
            QualityLevel::Insuficiente => self.insuficiente,
        }
    }

    /// The modal label and its probability.
    ///
    /// Ties resolve toward the better label, matching the ordering of the
    /// underlying thresholds.
    #[must_use]
    pub fn argmax(&self) -> (QualityLevel, f64) {
        let mut best = (QualityLevel::Insuficiente, self.insuficiente);
        for label in [
            QualityLevel::Aceptable,
            QualityLevel::Bueno,
            QualityLevel::Excelente,
        ] {
            let p = self.of(label);
            if p >= best.1 {
                best = (label, p);
            }
        }
        best
    }
}

/// What a calibrable method returns from `calibrate_output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCalibrationResult {
    /// Calibrated score on `[0, 1]`.
    pub calibrated_score: f64,

    /// Probability mass over the quality labels.
    pub label_probabilities: LabelProbabilityMass,

    /// Name of the transformation applied (e.g. "identity",
    /// "beta_shrinkage").
    pub transformation: String,

    /// Posterior samples backing the calibration, when retained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posterior_samples: Option<Vec<f64>>,

    /// 95% credible interval, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credible_interval_95: Option<ConfidenceInterval>,
}

/// Provenance record appended to the audit log for every calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProvenance {
    /// Question the calibration belongs to, when question-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,

    /// Producing method ("class.method") or "central_policy".
    pub method: String,

    /// The raw score before calibration.
    pub raw_score: f64,

    /// Transformation applied.
    pub transformation: String,

    /// Output domain description (e.g. "unit_interval").
    pub domain: String,

    /// Number of posterior samples considered (0 when analytic).
    pub posterior_sample_count: usize,

    /// Probability mass over labels.
    pub label_probabilities: LabelProbabilityMass,

    /// Assigned label.
    pub label: QualityLevel,

    /// Assigned weight.
    pub weight: f64,

    /// Deterministic hash over the fields above.
    pub provenance_hash: String,
}

impl CalibrationProvenance {
    /// Computes and records the deterministic provenance hash.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn sealed(mut self) -> Result<Self> {
        self.provenance_hash = String::new();
        self.provenance_hash = canonical_sha256(&self)?;
        Ok(self)
    }
}

/// The outcome of one calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedOutput {
    /// Assigned quality label (argmax of the mass).
    pub label: QualityLevel,

    /// Weight: `base_weight(label) * (0.7 + 0.3 * modal_probability)`.
    pub weight: f64,

    /// Calibrated score on `[0, 1]`.
    pub calibrated_score: f64,

    /// Probability mass over labels.
    pub label_probabilities: LabelProbabilityMass,

    /// 95% credible interval, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credible_interval_95: Option<ConfidenceInterval>,

    /// Provenance record (also appended to the audit log).
    pub provenance: CalibrationProvenance,
}

/// Computes the modulated weight for a label given its modal probability.
#[must_use]
pub fn modulated_weight(label: QualityLevel, modal_probability: f64) -> f64 {
    label.base_weight() * (0.7 + 0.3 * modal_probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_normalization_enforced() {
        assert!(LabelProbabilityMass::new(0.5, 0.3, 0.1, 0.1).is_ok());
        assert!(LabelProbabilityMass::new(0.5, 0.3, 0.1, 0.2).is_err());
        assert!(LabelProbabilityMass::new(1.1, -0.1, 0.0, 0.0).is_err());
        // Within tolerance.
        assert!(LabelProbabilityMass::new(0.5, 0.3, 0.1, 0.1 + 5e-7).is_ok());
    }

    #[test]
    fn test_argmax() {
        let mass = LabelProbabilityMass::new(0.1, 0.6, 0.2, 0.1).unwrap();
        let (label, p) = mass.argmax();
        assert_eq!(label, QualityLevel::Bueno);
        assert!((p - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_tie_prefers_better_label() {
        let mass = LabelProbabilityMass::new(0.4, 0.4, 0.1, 0.1).unwrap();
        assert_eq!(mass.argmax().0, QualityLevel::Excelente);
    }

    #[test]
    fn test_certain_mass() {
        let mass = LabelProbabilityMass::certain(QualityLevel::Aceptable);
        assert_eq!(mass.of(QualityLevel::Aceptable), 1.0);
        assert_eq!(mass.argmax().0, QualityLevel::Aceptable);
    }

    #[test]
    fn test_modulated_weight() {
        // Full confidence: weight equals base weight.
        assert!((modulated_weight(QualityLevel::Excelente, 1.0) - 1.0).abs() < 1e-12);
        // Zero modal probability floors at 0.7 of base.
        assert!((modulated_weight(QualityLevel::Bueno, 0.0) - 0.63).abs() < 1e-12);
    }

    #[test]
    fn test_provenance_hash_deterministic() {
        let provenance = CalibrationProvenance {
            question_id: Some("Q001".to_string()),
            method: "numeric_analyzer.analyze_quantities".to_string(),
            raw_score: 0.8,
            transformation: "identity".to_string(),
            domain: "unit_interval".to_string(),
            posterior_sample_count: 10_000,
            label_probabilities: LabelProbabilityMass::certain(QualityLevel::Bueno),
            label: QualityLevel::Bueno,
            weight: 0.9,
            provenance_hash: String::new(),
        };
        let a = provenance.clone().sealed().unwrap();
        let b = provenance.sealed().unwrap();
        assert_eq!(a.provenance_hash, b.provenance_hash);
        assert!(!a.provenance_hash.is_empty());
    }
}
