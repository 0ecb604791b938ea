//! Pipeline driver and cross-cutting concerns (C11).

pub mod abort;
pub mod driver;
pub mod instrumentation;
pub mod resources;

pub use abort::{AbortReason, AbortSignal};
pub use driver::{PhaseTimeouts, PipelineDriver, RunRequest, RunSummary};
pub use instrumentation::{LatencyHistogram, LatencySummary, PhaseMetrics, PhaseRecorder};
pub use resources::{
    CPU_THRESHOLD, MEMORY_THRESHOLD_MB, ResourceSampler, ResourceSnapshot, SAMPLE_CAPACITY,
};
