//! Executable tasks and the immutable execution plan.

use crate::contract::schema::ExpectedElement;
use crate::core::ids::{Dimension, PolicyArea, QuestionId};
use crate::error::Result;
use crate::hashing::{canonical_sha256, sha256_hex};
use crate::questionnaire::PatternSpec;
use crate::signal::registry::ResolvedSignals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The Phase-2 unit of work: one question bound to its chunk, patterns and
/// signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableTask {
    /// Globally unique task identifier ("MQC-001_PA01").
    pub task_id: String,

    /// Question identity.
    pub question_id: QuestionId,

    /// Policy area coordinate.
    pub policy_area: PolicyArea,

    /// Dimension coordinate.
    pub dimension: Dimension,

    /// Bound chunk identifier ("PA01-DIM01").
    pub chunk_id: String,

    /// The bound chunk's text.
    pub chunk_text: String,

    /// Patterns applicable to this question's chunk.
    pub applicable_patterns: Vec<PatternSpec>,

    /// Signals resolved from the policy-area pack.
    pub resolved_signals: ResolvedSignals,

    /// Elements the evidence is expected to surface.
    pub expected_elements: Vec<ExpectedElement>,
}

/// The hash-relevant projection of a task.
///
/// Excludes chunk text (covered separately by the integrity hash) so the
/// plan id captures the binding structure, not the document bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProjection {
    /// Task identifier.
    pub task_id: String,

    /// Question identifier.
    pub question_id: QuestionId,

    /// Bound chunk identifier.
    pub chunk_id: String,

    /// Ids of the applicable patterns, in order.
    pub pattern_ids: Vec<String>,

    /// Names of the resolved signals, mandatory first.
    pub signal_names: Vec<String>,
}

impl ExecutableTask {
    /// The task's hash-relevant projection.
    #[must_use]
    pub fn projection(&self) -> TaskProjection {
        TaskProjection {
            task_id: self.task_id.clone(),
            question_id: self.question_id,
            chunk_id: self.chunk_id.clone(),
            pattern_ids: self
                .applicable_patterns
                .iter()
                .map(|p| p.id.clone())
                .collect(),
            signal_names: self.resolved_signals.names(),
        }
    }
}

/// Immutable tuple of the 300 tasks plus identity and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Tasks ordered by global question number.
    tasks: Vec<ExecutableTask>,

    /// SHA-256 over the canonical serialization of the task projections.
    pub plan_id: String,

    /// SHA-256 binding the plan id to the chunk texts.
    pub integrity_hash: String,

    /// Correlation id of the producing run.
    pub correlation_id: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ExecutionPlan {
    /// Assembles the plan, computing its identity hashes.
    ///
    /// # Errors
    ///
    /// Returns an error if canonical serialization fails.
    pub fn assemble(tasks: Vec<ExecutableTask>, correlation_id: String) -> Result<Self> {
        let projections: Vec<TaskProjection> =
            tasks.iter().map(ExecutableTask::projection).collect();
        let plan_id = canonical_sha256(&projections)?;

        let mut integrity_input = plan_id.clone();
        for task in &tasks {
            integrity_input.push_str(&sha256_hex(task.chunk_text.as_bytes()));
        }
        let integrity_hash = sha256_hex(integrity_input.as_bytes());

        Ok(Self {
            tasks,
            plan_id,
            integrity_hash,
            correlation_id,
            created_at: Utc::now(),
        })
    }

    /// Tasks ordered by global question number.
    #[must_use]
    pub fn tasks(&self) -> &[ExecutableTask] {
        &self.tasks
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the plan carries no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The task projections, for manifests.
    #[must_use]
    pub fn projections(&self) -> Vec<TaskProjection> {
        self.tasks.iter().map(ExecutableTask::projection).collect()
    }
}
