//! Resource sampling and adaptive worker sizing.
//!
//! The sampler keeps a ring buffer of the last 120 CPU/memory snapshots
//! and recommends a worker count in `[4, 64]`: the pool is halved toward
//! the floor while CPU exceeds 85% or memory exceeds 4 GB.

use crate::config::runtime::{MAX_WORKERS, MIN_WORKERS};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use sysinfo::System;

/// Ring-buffer capacity.
pub const SAMPLE_CAPACITY: usize = 120;

/// CPU saturation threshold, percent.
pub const CPU_THRESHOLD: f32 = 85.0;

/// Memory pressure threshold, megabytes.
pub const MEMORY_THRESHOLD_MB: u64 = 4 * 1024;

/// One resource snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Sample timestamp.
    pub at: DateTime<Utc>,

    /// Global CPU usage, percent.
    pub cpu_percent: f32,

    /// Process memory, megabytes.
    pub memory_mb: u64,
}

impl ResourceSnapshot {
    /// Whether the snapshot crosses a pressure threshold.
    #[must_use]
    pub fn under_pressure(&self) -> bool {
        self.cpu_percent > CPU_THRESHOLD || self.memory_mb > MEMORY_THRESHOLD_MB
    }
}

/// Sampler owning the sysinfo handle and the snapshot ring buffer.
pub struct ResourceSampler {
    system: Mutex<System>,
    samples: Mutex<VecDeque<ResourceSnapshot>>,
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler {
    /// Creates a sampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            samples: Mutex::new(VecDeque::with_capacity(SAMPLE_CAPACITY)),
        }
    }

    /// Takes one snapshot, retaining the last [`SAMPLE_CAPACITY`].
    pub fn sample(&self) -> ResourceSnapshot {
        let snapshot = {
            let mut system = self.system.lock();
            system.refresh_cpu_usage();
            system.refresh_memory();
            ResourceSnapshot {
                at: Utc::now(),
                cpu_percent: system.global_cpu_info().cpu_usage(),
                memory_mb: system.used_memory() / (1024 * 1024),
            }
        };
        let mut samples = self.samples.lock();
        if samples.len() == SAMPLE_CAPACITY {
            samples.pop_front();
        }
        samples.push_back(snapshot.clone());
        snapshot
    }

    /// Snapshot history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<ResourceSnapshot> {
        self.samples.lock().iter().cloned().collect()
    }

    /// Recommends a worker count given the latest snapshot.
    ///
    /// Halves the pool toward the floor under pressure; otherwise keeps
    /// the requested count, clamped to `[MIN_WORKERS, MAX_WORKERS]`.
    #[must_use]
    pub fn recommend_workers(&self, requested: usize) -> usize {
        let clamped = requested.clamp(MIN_WORKERS, MAX_WORKERS);
        let pressured = self
            .samples
            .lock()
            .back()
            .is_some_and(ResourceSnapshot::under_pressure);
        if pressured {
            (clamped / 2).max(MIN_WORKERS)
        } else {
            clamped
        }
    }
}
