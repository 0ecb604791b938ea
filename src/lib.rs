//! # planqa-rs
//!
//! Deterministic quality assessment of municipal development plans.
//!
//! The pipeline ingests a long-form plan document and scores it against a
//! fixed questionnaire of 300 micro-questions over 10 policy areas and 6
//! analytical dimensions, producing a multi-level scoring tree (micro,
//! dimension, area, cluster, macro) with full provenance from every score
//! back to its textual evidence.
//!
//! ## Phases
//!
//! - **Phase 0**: bootstrap, input hashing, seed derivation and the
//!   four-gate admission protocol
//! - **Phase 1**: ingestion into the 60-slot chunk matrix
//! - **Phase 2**: plan build (the 300-row JOIN table) and per-question
//!   evidence pipelines with calibration
//! - **Phases 4–7**: dimension, area, cluster and macro aggregation under
//!   strict invariants
//! - **Phases 9–10**: deterministic report rendering with a signed
//!   manifest

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped input hashing (memmap2)
#![warn(unsafe_code)]

pub mod aggregation;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod contract;
pub mod core;
pub mod error;
pub mod evidence;
pub mod hashing;
pub mod ingest;
pub mod io;
pub mod methods;
pub mod pipeline;
pub mod plan;
pub mod questionnaire;
pub mod report;
pub mod signal;
pub mod synthesis;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use self::core::{
    AreaScore, BaseSlot, Chunk, ChunkMatrix, Cluster, ClusterScore, Dimension, DimensionScore,
    MacroScore, PolicyArea, QualityLevel, QuestionId, ScoreThresholds, ScoredMicroQuestion,
};

// Re-export the pipeline entry points
pub use config::{Mode, RuntimeConfig};
pub use pipeline::{PipelineDriver, RunRequest, RunSummary};
pub use plan::{ExecutableTask, ExecutionPlan};

// Re-export registries
pub use contract::ContractRegistry;
pub use questionnaire::Questionnaire;
pub use signal::SignalRegistry;

// Re-export CLI types
pub use cli::{Cli, OutputFormat, execute};
