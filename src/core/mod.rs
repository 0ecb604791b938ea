//! Core domain types for the evaluation pipeline.
//!
//! The coordinate system (policy areas, dimensions, clusters, base slots,
//! question ids), the chunk matrix, the quality thresholds and the score
//! objects of every aggregation level.

pub mod chunk;
pub mod ids;
pub mod matrix;
pub mod scores;
pub mod thresholds;

pub use chunk::Chunk;
pub use ids::{
    BaseSlot, CHUNK_COUNT, CLUSTER_COUNT, Cluster, DIMENSION_COUNT, Dimension, POLICY_AREA_COUNT,
    PolicyArea, QUESTION_COUNT, QUESTIONS_PER_AREA, QUESTIONS_PER_CELL, QuestionId, chunk_id,
    task_id,
};
pub use matrix::ChunkMatrix;
pub use scores::{
    AreaScore, ClusterScore, ConfidenceInterval, DimensionRank, DimensionScore, DispersionShape,
    ExecutionTrace, MAX_SCORE, MacroScore, ScoredMicroQuestion, StrategicMetrics, SystemicGap,
};
pub use thresholds::{QualityLevel, ScoreThresholds};
