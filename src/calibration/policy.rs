//! Central calibration policy (C8).
//!
//! Delegates to the producing method's calibrable capability when it has
//! one; otherwise synthesizes a Gaussian posterior around the raw score
//! and buckets it against the loaded thresholds. Every decision appends a
//! provenance record to the audit log.

use crate::calibration::audit::CalibrationAudit;
use crate::calibration::output::{
    CalibratedOutput, CalibrationProvenance, LabelProbabilityMass, modulated_weight,
};
use crate::core::ids::QuestionId;
use crate::core::scores::ConfidenceInterval;
use crate::core::thresholds::ScoreThresholds;
use crate::error::{Error, Result};
use crate::methods::executor::MethodExecutor;
use crate::methods::traits::CalibrationContext;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use statrs::distribution::Normal;

/// Standard deviation of the synthetic posterior.
pub const SYNTHETIC_SIGMA: f64 = 0.1;

/// Sample count of the synthetic posterior.
pub const SYNTHETIC_SAMPLES: usize = 10_000;

/// The central calibration coordinator.
pub struct CalibrationPolicy {
    thresholds: ScoreThresholds,
    audit: CalibrationAudit,
}

impl CalibrationPolicy {
    /// Creates a policy over the loaded thresholds.
    #[must_use]
    pub fn new(thresholds: ScoreThresholds) -> Self {
        Self {
            thresholds,
            audit: CalibrationAudit::new(),
        }
    }

    /// The audit log.
    #[must_use]
    pub const fn audit(&self) -> &CalibrationAudit {
        &self.audit
    }

    /// Calibrates one raw score.
    ///
    /// When `provider` names a registered method exposing the calibrable
    /// capability, the method calibrates its own output; otherwise the
    /// central synthetic-posterior path runs.
    ///
    /// # Errors
    ///
    /// Returns an error when the probability mass cannot be constructed.
    pub fn calibrate(
        &self,
        executor: &MethodExecutor,
        provider: Option<(&str, &str)>,
        raw_score: f64,
        question_id: Option<QuestionId>,
        seed: u64,
    ) -> Result<CalibratedOutput> {
        let context = CalibrationContext {
            thresholds: self.thresholds,
            seed,
        };

        let delegated = provider.and_then(|(class, method)| {
            executor
                .get(class, method)
                .ok()
                .and_then(|m| m.calibration().map(|c| (format!("{class}.{method}"), c)))
        });

        let (method_name, calibrated_score, mass, interval, transformation, domain, sample_count) =
            if let Some((name, capability)) = delegated {
                let result = capability
                    .calibrate_output(raw_score, None, &context)
                    .map_err(|e| Error::InvalidState {
                        message: format!("calibration delegation failed: {e}"),
                    })?;
                let samples = result.posterior_samples.as_ref().map_or(0, Vec::len);
                (
                    name,
                    result.calibrated_score,
                    result.label_probabilities,
                    result.credible_interval_95,
                    result.transformation,
                    capability.output_domain().name.to_string(),
                    samples,
                )
            } else {
                let (mass, interval) = self.synthetic_posterior(raw_score, seed)?;
                (
                    "central_policy".to_string(),
                    raw_score,
                    mass,
                    Some(interval),
                    "synthetic_gaussian".to_string(),
                    "unit_interval".to_string(),
                    SYNTHETIC_SAMPLES,
                )
            };

        let (label, modal_probability) = mass.argmax();
        let weight = modulated_weight(label, modal_probability);

        let provenance = CalibrationProvenance {
            question_id: question_id.map(|q| q.to_string()),
            method: method_name,
            raw_score,
            transformation,
            domain,
            posterior_sample_count: sample_count,
            label_probabilities: mass,
            label,
            weight,
            provenance_hash: String::new(),
        }
        .sealed()?;
        self.audit.append(provenance.clone());

        Ok(CalibratedOutput {
            label,
            weight,
            calibrated_score,
            label_probabilities: mass,
            credible_interval_95: interval,
            provenance,
        })
    }

    /// Synthesizes a clipped Gaussian posterior around the raw score and
    /// buckets it against the thresholds.
    fn synthetic_posterior(
        &self,
        raw_score: f64,
        seed: u64,
    ) -> Result<(LabelProbabilityMass, ConfidenceInterval)> {
        let normal = Normal::new(raw_score, SYNTHETIC_SIGMA).map_err(|e| Error::InvalidState {
            message: format!("posterior construction failed: {e}"),
        })?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut samples: Vec<f64> = (0..SYNTHETIC_SAMPLES)
            .map(|_| rng.sample::<f64, _>(normal).clamp(0.0, 1.0))
            .collect();

        let mut counts = [0usize; 4];
        for sample in &samples {
            counts[self.thresholds.classify(*sample) as usize] += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = samples.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let mass = LabelProbabilityMass::new(
            counts[3] as f64 / total,
            counts[2] as f64 / total,
            counts[1] as f64 / total,
            counts[0] as f64 / total,
        )?;

        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let lower = samples[(total * 0.025) as usize];
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let upper = samples[((total * 0.975) as usize).min(samples.len() - 1)];
        Ok((mass, ConfidenceInterval::new(lower, upper)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::thresholds::QualityLevel;

    fn policy() -> CalibrationPolicy {
        CalibrationPolicy::new(ScoreThresholds::new(0.85, 0.70, 0.55).unwrap())
    }

    #[test]
    fn test_central_path_high_score() {
        let policy = policy();
        let executor = MethodExecutor::standard();
        let out = policy
            .calibrate(&executor, None, 0.95, QuestionId::new(1).ok(), 7)
            .unwrap();
        assert_eq!(out.label, QualityLevel::Excelente);
        assert!(out.weight > 0.9);
        assert_eq!(out.provenance.method, "central_policy");
        assert_eq!(out.provenance.transformation, "synthetic_gaussian");
        assert_eq!(policy.audit().len(), 1);
    }

    #[test]
    fn test_central_path_boundary_score_spreads_mass() {
        let policy = policy();
        let executor = MethodExecutor::standard();
        let out = policy.calibrate(&executor, None, 0.70, None, 7).unwrap();
        // Sitting on the BUENO cut, roughly half the mass falls either side.
        assert!(out.label_probabilities.bueno > 0.3);
        assert!(out.label_probabilities.aceptable > 0.3);
        assert!(out.credible_interval_95.is_some());
    }

    #[test]
    fn test_delegated_path_uses_method_capability() {
        let policy = policy();
        let executor = MethodExecutor::standard();
        let out = policy
            .calibrate(
                &executor,
                Some(("numeric_analyzer", "analyze_quantities")),
                0.80,
                QuestionId::new(6).ok(),
                7,
            )
            .unwrap();
        assert_eq!(
            out.provenance.method,
            "numeric_analyzer.analyze_quantities"
        );
        assert_eq!(out.provenance.transformation, "beta_shrinkage");
    }

    #[test]
    fn test_non_calibrable_provider_falls_back() {
        let policy = policy();
        let executor = MethodExecutor::standard();
        let out = policy
            .calibrate(
                &executor,
                Some(("text_miner", "extract_patterns")),
                0.60,
                None,
                7,
            )
            .unwrap();
        assert_eq!(out.provenance.method, "central_policy");
    }

    #[test]
    fn test_determinism_per_seed() {
        let policy = policy();
        let executor = MethodExecutor::standard();
        let a = policy.calibrate(&executor, None, 0.72, None, 42).unwrap();
        let b = policy.calibrate(&executor, None, 0.72, None, 42).unwrap();
        assert_eq!(a.label_probabilities, b.label_probabilities);
        assert_eq!(a.provenance.provenance_hash, b.provenance.provenance_hash);
    }

    #[test]
    fn test_weight_formula() {
        let policy = policy();
        let executor = MethodExecutor::standard();
        let out = policy.calibrate(&executor, None, 0.99, None, 7).unwrap();
        let expected = QualityLevel::Excelente.base_weight()
            * (0.7 + 0.3 * out.label_probabilities.excelente);
        assert!((out.weight - expected).abs() < 1e-12);
    }
}
