//! Bootstrap confidence intervals for dimension aggregation.

use crate::core::scores::ConfidenceInterval;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Resampling rounds.
pub const BOOTSTRAP_ROUNDS: usize = 1_000;

/// Resamples micro scores (on `[0, 1]`) with replacement and returns the
/// 95% interval of the resampled means, rescaled to `[0, 3]`.
///
/// Deterministic for a given seed. Returns `None` for fewer than two
/// scores.
#[must_use]
pub fn bootstrap_interval(scores: &[f64], seed: u64) -> Option<ConfidenceInterval> {
    if scores.len() < 2 {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut means = Vec::with_capacity(BOOTSTRAP_ROUNDS);
    #[allow(clippy::cast_precision_loss)]
    let n = scores.len() as f64;
    for _ in 0..BOOTSTRAP_ROUNDS {
        let sum: f64 = (0..scores.len())
            .map(|_| scores[rng.gen_range(0..scores.len())])
            .sum();
        means.push(sum / n);
    }
    means.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower_idx = (means.len() as f64 * 0.025).floor() as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let upper_idx = ((means.len() as f64 * 0.975).ceil() as usize - 1).min(means.len() - 1);
    Some(ConfidenceInterval::new(
        means[lower_idx] * 3.0,
        means[upper_idx] * 3.0,
    ))
}
