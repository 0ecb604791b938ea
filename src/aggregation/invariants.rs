//! Aggregation invariants (AGG-001..AGG-006).
//!
//! Each check returns an optional violation; the aggregators accumulate
//! them and the driver decides whether a severity aborts or propagates as
//! a warning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tolerance for weight normalization.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Numeric slack for convexity comparisons.
const CONVEXITY_EPSILON: f64 = 1e-9;

/// Severity of an aggregation violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViolationSeverity {
    /// Informational; surfaced in the manifest only.
    Warning,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity; aborts the run.
    Critical,
}

/// One recorded invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Invariant identifier ("AGG-001".."AGG-006").
    pub invariant: String,

    /// Aggregation level the violation occurred at.
    pub level: String,

    /// Severity.
    pub severity: ViolationSeverity,

    /// Human-readable description.
    pub message: String,
}

impl Violation {
    fn new(invariant: &str, level: &str, severity: ViolationSeverity, message: String) -> Self {
        Self {
            invariant: invariant.to_string(),
            level: level.to_string(),
            severity,
            message,
        }
    }
}

/// AGG-001: a weight vector sums to 1 ± 1e-6. CRITICAL.
#[must_use]
pub fn check_weights(weights: &[f64], level: &str) -> Option<Violation> {
    let sum: f64 = weights.iter().sum();
    ((sum - 1.0).abs() > WEIGHT_TOLERANCE).then(|| {
        Violation::new(
            "AGG-001",
            level,
            ViolationSeverity::Critical,
            format!("weights sum to {sum}"),
        )
    })
}

/// AGG-002: scores stay within `[0, 3]`. HIGH.
#[must_use]
pub fn check_score_bounds(score: f64, level: &str) -> Option<Violation> {
    (!(0.0..=3.0).contains(&score)).then(|| {
        Violation::new(
            "AGG-002",
            level,
            ViolationSeverity::High,
            format!("score {score} outside [0, 3]"),
        )
    })
}

/// AGG-003: coherence stays within `[0, 1]`. MEDIUM.
#[must_use]
pub fn check_coherence_bounds(coherence: f64, level: &str) -> Option<Violation> {
    (!(0.0..=1.0).contains(&coherence)).then(|| {
        Violation::new(
            "AGG-003",
            level,
            ViolationSeverity::Medium,
            format!("coherence {coherence} outside [0, 1]"),
        )
    })
}

/// AGG-004: the input set equals the expected set (no gaps, extras or
/// duplicates). Severity varies by level.
#[must_use]
pub fn check_hermeticity(
    expected: &BTreeSet<String>,
    actual: &[String],
    level: &str,
    severity: ViolationSeverity,
) -> Option<Violation> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for item in actual {
        if !seen.insert(item.clone()) {
            duplicates.push(item.clone());
        }
    }
    let missing: Vec<&String> = expected.difference(&seen).collect();
    let extra: Vec<&String> = seen.difference(expected).collect();

    if missing.is_empty() && extra.is_empty() && duplicates.is_empty() {
        return None;
    }
    Some(Violation::new(
        "AGG-004",
        level,
        severity,
        format!("missing={missing:?} extra={extra:?} duplicates={duplicates:?}"),
    ))
}

/// AGG-006: `min(inputs) <= aggregated <= max(inputs)`. HIGH.
#[must_use]
pub fn check_convexity(inputs: &[f64], aggregated: f64, level: &str) -> Option<Violation> {
    if inputs.is_empty() {
        return None;
    }
    let min = inputs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = inputs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (aggregated < min - CONVEXITY_EPSILON || aggregated > max + CONVEXITY_EPSILON).then(|| {
        Violation::new(
            "AGG-006",
            level,
            ViolationSeverity::High,
            format!("aggregated {aggregated} outside [{min}, {max}]"),
        )
    })
}

/// Equal weights for `n` inputs.
#[must_use]
pub fn equal_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return vec![];
    }
    #[allow(clippy::cast_precision_loss)]
    vec![1.0 / n as f64; n]
}

/// Weighted mean of values.
#[must_use]
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    values
        .iter()
        .zip(weights)
        .map(|(v, w)| v * w)
        .sum()
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
