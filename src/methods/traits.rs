//! Method capability traits.
//!
//! A method instance is a value conforming to a declared capability set:
//! every method exposes its identity, argument specification and an
//! `invoke`; some additionally expose the calibrable-method capability.
//! Capabilities are probed once at registration time, not per call.

use crate::calibration::output::MethodCalibrationResult;
use crate::core::thresholds::ScoreThresholds;
use crate::error::MethodError;
use crate::methods::context::{MethodArgs, MethodValue, QuestionStore};

/// Declared parameter set of a method.
///
/// The router rejects unknown keys (strict) and missing required keys; no
/// parameter is ever silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    /// Keys that must be present.
    pub required: &'static [&'static str],

    /// Keys that may be present.
    pub optional: &'static [&'static str],
}

impl ArgSpec {
    /// Whether a key is known to this spec.
    #[must_use]
    pub fn accepts(&self, key: &str) -> bool {
        self.required.contains(&key) || self.optional.contains(&key)
    }
}

/// Output-domain description of a calibrable method.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDomain {
    /// Domain name (e.g. "unit_interval").
    pub name: &'static str,

    /// Semantics of the raw score.
    pub semantics: &'static str,

    /// Optional prior parameters (alpha, beta) for shrinkage.
    pub prior: Option<(f64, f64)>,
}

/// Context handed to a calibrable method.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationContext {
    /// Loaded scoring thresholds.
    pub thresholds: ScoreThresholds,

    /// Deterministic seed for any sampling the method performs.
    pub seed: u64,
}

/// The calibrable-method capability.
pub trait CalibrableMethod: Send + Sync {
    /// Describes the method's output domain.
    fn output_domain(&self) -> OutputDomain;

    /// Calibrates a raw score into a label-probability mass.
    ///
    /// # Errors
    ///
    /// Returns an error when the raw score is outside the declared domain.
    fn calibrate_output(
        &self,
        raw_score: f64,
        posterior_samples: Option<&[f64]>,
        context: &CalibrationContext,
    ) -> std::result::Result<MethodCalibrationResult, MethodError>;
}

/// An analytical method hosted by the executor.
///
/// Implementations must be `Send + Sync`: Phase-2 tasks run on a worker
/// pool and share the executor read-only. Methods read prior outputs from
/// the per-question store and return the value published under their
/// contract-declared `provides` key.
pub trait AnalyticalMethod: Send + Sync {
    /// Class name as referenced by contracts.
    fn class_name(&self) -> &'static str;

    /// Method name as referenced by contracts.
    fn method_name(&self) -> &'static str;

    /// Declared parameter set.
    fn arg_spec(&self) -> ArgSpec;

    /// Runs the method.
    ///
    /// # Errors
    ///
    /// Returns a [`MethodError`] on execution failure; the caller retries
    /// once with the optional arguments stripped.
    fn invoke(
        &self,
        args: &MethodArgs,
        store: &QuestionStore,
    ) -> std::result::Result<MethodValue, MethodError>;

    /// The calibrable-method capability, when exposed.
    fn calibration(&self) -> Option<&dyn CalibrableMethod> {
        None
    }

    /// Full dotted name ("class.method").
    fn full_name(&self) -> String {
        format!("{}.{}", self.class_name(), self.method_name())
    }
}
