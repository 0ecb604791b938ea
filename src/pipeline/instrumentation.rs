//! Per-phase instrumentation.
//!
//! Each phase records its start time, duration, item progress, throughput,
//! a latency histogram (p50/p95/p99), warnings, errors and anomaly flags.
//! The collected metrics persist post-run as `phase_metrics.json` and
//! `latency_histograms.json`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Latency percentiles of one phase's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Median item latency, milliseconds.
    pub p50_ms: f64,
    /// 95th percentile, milliseconds.
    pub p95_ms: f64,
    /// 99th percentile, milliseconds.
    pub p99_ms: f64,
}

/// Item latency recorder shared across workers.
#[derive(Debug, Default)]
pub struct LatencyHistogram {
    samples_ms: Mutex<Vec<f64>>,
}

impl LatencyHistogram {
    /// Creates an empty histogram.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one item latency in milliseconds.
    pub fn record(&self, millis: f64) {
        self.samples_ms.lock().push(millis);
    }

    /// Number of recorded samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples_ms.lock().len()
    }

    /// Whether no samples were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples_ms.lock().is_empty()
    }

    /// Percentile over the recorded samples (nearest-rank).
    #[must_use]
    pub fn percentile(&self, p: f64) -> f64 {
        let mut samples = self.samples_ms.lock().clone();
        if samples.is_empty() {
            return 0.0;
        }
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rank = ((p / 100.0 * samples.len() as f64).ceil() as usize)
            .clamp(1, samples.len());
        samples[rank - 1]
    }

    /// The p50/p95/p99 summary.
    #[must_use]
    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            p50_ms: self.percentile(50.0),
            p95_ms: self.percentile(95.0),
            p99_ms: self.percentile(99.0),
        }
    }

    /// Raw samples, for the latency artifact.
    #[must_use]
    pub fn samples(&self) -> Vec<f64> {
        self.samples_ms.lock().clone()
    }
}

/// Completed metrics of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    /// Phase name ("phase0_gates", "phase2_execution", ...).
    pub phase: String,

    /// Start timestamp.
    pub started_at: DateTime<Utc>,

    /// Wall duration in milliseconds.
    pub duration_ms: f64,

    /// Items processed.
    pub items_processed: usize,

    /// Items expected.
    pub items_total: usize,

    /// Completion fraction.
    pub progress: f64,

    /// Items per second.
    pub throughput_per_s: f64,

    /// Latency percentiles.
    pub latency: LatencySummary,

    /// Warnings recorded during the phase.
    pub warnings: Vec<String>,

    /// Errors recorded during the phase.
    pub errors: Vec<String>,

    /// Anomaly flags (e.g. "zero_throughput", "timeout").
    pub anomaly_flags: Vec<String>,
}

/// Active recorder for one phase.
pub struct PhaseRecorder {
    phase: String,
    started_at: DateTime<Utc>,
    started: Instant,
    items_total: usize,
    /// Item latency histogram; workers record into it directly.
    pub latency: LatencyHistogram,
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl PhaseRecorder {
    /// Starts recording a phase.
    #[must_use]
    pub fn start(phase: &str, items_total: usize) -> Self {
        Self {
            phase: phase.to_string(),
            started_at: Utc::now(),
            started: Instant::now(),
            items_total,
            latency: LatencyHistogram::new(),
            warnings: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Records a warning.
    pub fn warn(&self, message: String) {
        self.warnings.lock().push(message);
    }

    /// Records an error.
    pub fn error(&self, message: String) {
        self.errors.lock().push(message);
    }

    /// Elapsed wall time.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    /// Finishes the phase, producing its metrics.
    #[must_use]
    pub fn finish(self, items_processed: usize) -> PhaseMetrics {
        let duration = self.started.elapsed();
        let duration_ms = duration.as_secs_f64() * 1000.0;
        #[allow(clippy::cast_precision_loss)]
        let progress = if self.items_total == 0 {
            1.0
        } else {
            items_processed as f64 / self.items_total as f64
        };
        #[allow(clippy::cast_precision_loss)]
        let throughput_per_s = if duration.as_secs_f64() > 0.0 {
            items_processed as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        let mut anomaly_flags = Vec::new();
        if items_processed < self.items_total {
            anomaly_flags.push("incomplete".to_string());
        }
        if items_processed > 0 && throughput_per_s == 0.0 {
            anomaly_flags.push("zero_throughput".to_string());
        }

        PhaseMetrics {
            phase: self.phase,
            started_at: self.started_at,
            duration_ms,
            items_processed,
            items_total: self.items_total,
            progress,
            throughput_per_s,
            latency: self.latency.summary(),
            warnings: self.warnings.into_inner(),
            errors: self.errors.into_inner(),
            anomaly_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles() {
        let histogram = LatencyHistogram::new();
        for i in 1..=100 {
            histogram.record(f64::from(i));
        }
        assert_eq!(histogram.len(), 100);
        assert!((histogram.percentile(50.0) - 50.0).abs() < 1e-9);
        assert!((histogram.percentile(95.0) - 95.0).abs() < 1e-9);
        assert!((histogram.percentile(99.0) - 99.0).abs() < 1e-9);
        let summary = histogram.summary();
        assert!(summary.p50_ms <= summary.p95_ms);
        assert!(summary.p95_ms <= summary.p99_ms);
    }

    #[test]
    fn test_empty_histogram() {
        let histogram = LatencyHistogram::new();
        assert!(histogram.is_empty());
        assert_eq!(histogram.percentile(50.0), 0.0);
    }

    #[test]
    fn test_phase_recorder_complete() {
        let recorder = PhaseRecorder::start("phase2_execution", 10);
        recorder.latency.record(1.5);
        recorder.warn("one warning".to_string());
        let metrics = recorder.finish(10);
        assert_eq!(metrics.phase, "phase2_execution");
        assert!((metrics.progress - 1.0).abs() < 1e-12);
        assert_eq!(metrics.warnings.len(), 1);
        assert!(metrics.errors.is_empty());
        assert!(metrics.anomaly_flags.is_empty());
        assert!(metrics.throughput_per_s > 0.0);
    }

    #[test]
    fn test_incomplete_phase_flagged() {
        let recorder = PhaseRecorder::start("phase2_execution", 10);
        recorder.error("boom".to_string());
        let metrics = recorder.finish(4);
        assert!((metrics.progress - 0.4).abs() < 1e-12);
        assert!(metrics.anomaly_flags.contains(&"incomplete".to_string()));
        assert_eq!(metrics.errors.len(), 1);
    }

    #[test]
    fn test_zero_total_phase() {
        let metrics = PhaseRecorder::start("phase9_report", 0).finish(0);
        assert!((metrics.progress - 1.0).abs() < 1e-12);
    }
}
