//! Error types for the evaluation pipeline.
//!
//! This module provides a comprehensive error hierarchy using `thiserror` for
//! all pipeline stages: admission gates, contract and signal loading, plan
//! construction, per-question execution, aggregation and report rendering.
//! Every top-level variant maps to a stable CLI exit code.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Phase-0 admission gate failure.
    #[error("gate failure: {0}")]
    Gate(#[from] GateError),

    /// Contract load or validation failure.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    /// Signal pack load or resolution failure.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    /// Chunk matrix construction failure.
    #[error("chunk matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Plan build synchronization failure.
    #[error("synchronization error: {0}")]
    Sync(#[from] SyncError),

    /// Phase-2 execution aborted.
    #[error("execution aborted: {reason}")]
    Aborted {
        /// Reason recorded on the abort signal.
        reason: String,
    },

    /// Aggregation invariant violation of CRITICAL severity.
    #[error("aggregation violation: {0}")]
    Aggregation(#[from] AggregationError),

    /// Report rendering failure (Markdown/HTML).
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// I/O errors (file operations, artifact writes).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Questionnaire monolith defects.
    #[error("questionnaire error: {0}")]
    Questionnaire(#[from] QuestionnaireError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid state errors.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state.
        message: String,
    },
}

impl Error {
    /// Returns the CLI exit code for this error.
    ///
    /// Exit codes are part of the external interface: `10` gate failure,
    /// `11` contract/signal load failure, `12` chunk-matrix failure,
    /// `13` plan build failure, `20` Phase-2 abort, `30` aggregation
    /// invariant violation, `40` report render failure, `2` usage error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Gate(_) => 10,
            Self::Contract(_) | Self::Signal(_) | Self::Questionnaire(_) => 11,
            Self::Matrix(_) => 12,
            Self::Sync(_) => 13,
            Self::Aborted { .. } => 20,
            Self::Aggregation(_) => 30,
            Self::Render(_) => 40,
            Self::Config { .. } => 2,
            Self::Io(_) | Self::InvalidState { .. } => 1,
        }
    }
}

/// Phase-0 admission gate failures, one variant per gate.
#[derive(Error, Debug)]
pub enum GateError {
    /// Bootstrap gate: config, seed registry or artifact root missing.
    #[error("bootstrap gate failed: {reason}")]
    Bootstrap {
        /// What part of the bootstrap is missing or broken.
        reason: String,
    },

    /// Input verification gate: an input hash is missing or empty.
    #[error("input verification gate failed: {reason}")]
    InputVerification {
        /// Which hash is missing and why.
        reason: String,
    },

    /// Boot-check gate: a declared collaborator is missing.
    #[error("boot check gate failed: {missing} missing in {mode} mode")]
    BootCheck {
        /// Name of the missing collaborator.
        missing: String,
        /// Runtime mode in which the check ran.
        mode: String,
    },

    /// Determinism gate: a mandatory seed is absent or was not applied.
    #[error("determinism gate failed: seed {seed} {problem}")]
    Determinism {
        /// Name of the offending seed.
        seed: String,
        /// What went wrong (missing, not applied).
        problem: String,
    },
}

impl GateError {
    /// Stable identifier of the failed gate (used in manifests).
    #[must_use]
    pub const fn gate_id(&self) -> &'static str {
        match self {
            Self::Bootstrap { .. } => "G1_BOOTSTRAP",
            Self::InputVerification { .. } => "G2_INPUT_VERIFICATION",
            Self::BootCheck { .. } => "G3_BOOT_CHECKS",
            Self::Determinism { .. } => "G4_DETERMINISM",
        }
    }
}

/// Contract load and validation failures.
#[derive(Error, Debug)]
pub enum ContractError {
    /// Contract file could not be parsed.
    #[error("contract {question_id}: parse failed: {reason}")]
    Parse {
        /// Question identifier (Q001..Q300).
        question_id: String,
        /// Parser error text.
        reason: String,
    },

    /// Recomputed hash disagrees with the recorded `contract_hash`.
    #[error("contract {question_id}: hash mismatch (recorded {recorded}, computed {computed})")]
    HashMismatch {
        /// Question identifier.
        question_id: String,
        /// Hash recorded inside the contract.
        recorded: String,
        /// Hash recomputed from the canonical serialization.
        computed: String,
    },

    /// Identity fields disagree with the questionnaire layout (A1).
    #[error("contract {question_id}: identity mismatch: {reason}")]
    IdentityMismatch {
        /// Question identifier.
        question_id: String,
        /// Which identity field disagrees.
        reason: String,
    },

    /// An assembly rule references a source no method provides (A2).
    #[error("contract {question_id}: assembly source '{source_key}' not in method provides")]
    UnknownAssemblySource {
        /// Question identifier.
        question_id: String,
        /// The offending source key.
        source_key: String,
    },

    /// Mandatory signals present but threshold is not positive (A3).
    #[error("contract {question_id}: mandatory signals require a positive threshold")]
    ZeroSignalThreshold {
        /// Question identifier.
        question_id: String,
    },

    /// Required output field is missing or mistyped (A4).
    #[error("contract {question_id}: output schema defect: {reason}")]
    OutputSchema {
        /// Question identifier.
        question_id: String,
        /// Description of the defect.
        reason: String,
    },

    /// A positional group is not structurally identical across areas.
    #[error("base slot {base_slot}: positional equivalence broken: {reason}")]
    PositionalEquivalence {
        /// Base slot identifier (Dn-Qk).
        base_slot: String,
        /// Description of the divergence.
        reason: String,
    },

    /// Contract not found in the registry.
    #[error("contract not found: {question_id}")]
    NotFound {
        /// Question identifier that was not found.
        question_id: String,
    },

    /// Wrong number of contracts loaded.
    #[error("expected {expected} contracts, loaded {actual}")]
    Count {
        /// Expected contract count.
        expected: usize,
        /// Actual contract count.
        actual: usize,
    },
}

/// Signal pack load and resolution failures.
#[derive(Error, Debug)]
pub enum SignalError {
    /// Signal pack file could not be parsed.
    #[error("signal pack {policy_area}: parse failed: {reason}")]
    Parse {
        /// Policy area the pack belongs to.
        policy_area: String,
        /// Parser error text.
        reason: String,
    },

    /// Pack for a policy area is missing entirely.
    #[error("signal pack missing for {policy_area}")]
    PackMissing {
        /// Policy area without a pack.
        policy_area: String,
    },

    /// A mandatory signal is not present in the pack.
    #[error("{question_id}: mandatory signal '{signal}' missing from {policy_area} pack")]
    MandatorySignalMissing {
        /// Question requiring the signal.
        question_id: String,
        /// Missing signal name.
        signal: String,
        /// Policy area whose pack was consulted.
        policy_area: String,
    },
}

/// Chunk matrix construction failures.
#[derive(Error, Debug)]
pub enum MatrixError {
    /// Wrong total number of chunks.
    #[error("expected 60 chunks, got {actual}")]
    Count {
        /// Actual chunk count.
        actual: usize,
    },

    /// A (PA, DIM) cell has no chunk.
    #[error("missing chunk for ({policy_area}, {dimension})")]
    MissingCell {
        /// Policy area of the empty cell.
        policy_area: String,
        /// Dimension of the empty cell.
        dimension: String,
    },

    /// A (PA, DIM) cell received more than one chunk.
    #[error("duplicate chunk for ({policy_area}, {dimension})")]
    DuplicateCell {
        /// Policy area of the duplicated cell.
        policy_area: String,
        /// Dimension of the duplicated cell.
        dimension: String,
    },

    /// A chunk has no text.
    #[error("empty chunk text for ({policy_area}, {dimension})")]
    EmptyChunk {
        /// Policy area of the empty chunk.
        policy_area: String,
        /// Dimension of the empty chunk.
        dimension: String,
    },
}

/// Plan build synchronization failures.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Monolith counts disagree with the fixed layout.
    #[error("monolith count mismatch: {reason}")]
    MonolithCounts {
        /// Which count is off.
        reason: String,
    },

    /// Chunk lookup failed for a question.
    #[error("{question_id}: chunk {chunk_id} not found")]
    MissingChunk {
        /// Question whose chunk is missing.
        question_id: String,
        /// The chunk id that was looked up.
        chunk_id: String,
    },

    /// Chunk coordinates disagree with the question's coordinates.
    #[error("{question_id}: chunk coordinates mismatch: {reason}")]
    ChunkMismatch {
        /// Question with the mismatch.
        question_id: String,
        /// Description of the disagreement.
        reason: String,
    },

    /// A task id was emitted twice.
    #[error("duplicate task id: {task_id}")]
    DuplicateTask {
        /// The duplicated task identifier.
        task_id: String,
    },

    /// Cross-task cardinality check failed.
    #[error("cardinality violation: {reason}")]
    Cardinality {
        /// Which cardinality is off and how.
        reason: String,
    },
}

/// Per-question method execution failures (localized, never fatal to the plan).
#[derive(Error, Debug)]
pub enum MethodError {
    /// Method name not registered with the executor.
    #[error("unknown method: {class}.{method}")]
    UnknownMethod {
        /// Declared class name.
        class: String,
        /// Declared method name.
        method: String,
    },

    /// An argument key the method does not accept.
    #[error("{method}: unknown argument '{key}'")]
    UnknownArgument {
        /// Method that rejected the call.
        method: String,
        /// The rejected key.
        key: String,
    },

    /// A required argument is absent.
    #[error("{method}: missing required argument '{key}'")]
    MissingArgument {
        /// Method that rejected the call.
        method: String,
        /// The missing key.
        key: String,
    },

    /// The method body failed.
    #[error("{method}: execution failed: {reason}")]
    ExecutionFailed {
        /// Method that failed.
        method: String,
        /// Failure description.
        reason: String,
    },

    /// Evidence validation reported a critical failure.
    #[error("critical validation failure: {reason}")]
    CriticalValidation {
        /// Validation rule that fired.
        reason: String,
    },
}

/// Aggregation invariant violations promoted to errors (CRITICAL severity).
#[derive(Error, Debug)]
pub enum AggregationError {
    /// A weight vector does not sum to 1.
    #[error("{invariant} at {level}: weights sum to {sum}")]
    WeightNormalization {
        /// Invariant identifier (AGG-001).
        invariant: String,
        /// Aggregation level.
        level: String,
        /// Offending sum.
        sum: f64,
    },

    /// Input set does not match the expected set for the level.
    #[error("{invariant} at {level}: hermeticity broken: {reason}")]
    Hermeticity {
        /// Invariant identifier (AGG-004).
        invariant: String,
        /// Aggregation level.
        level: String,
        /// Gap/extra/duplicate description.
        reason: String,
    },

    /// A phase returned an empty result with non-empty inputs.
    #[error("{level}: empty aggregation result with {inputs} inputs")]
    EmptyResult {
        /// Aggregation level.
        level: String,
        /// Number of inputs that were provided.
        inputs: usize,
    },

    /// Macro score is zero while inputs are non-zero.
    #[error("macro score is zero with non-zero cluster inputs")]
    ZeroMacro,
}

/// Report rendering failures.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Markdown rendering failed.
    #[error("markdown rendering failed: {0}")]
    Markdown(String),

    /// HTML templating failed.
    #[error("HTML rendering failed: {0}")]
    Html(String),

    /// Chart rendering failed.
    #[error("chart rendering failed: {0}")]
    Chart(String),

    /// Report schema validation failed.
    #[error("report validation failed: {0}")]
    Schema(String),
}

/// Questionnaire monolith defects.
#[derive(Error, Debug)]
pub enum QuestionnaireError {
    /// Monolith file could not be parsed.
    #[error("monolith parse failed: {0}")]
    Parse(String),

    /// A structural count is wrong (questions, areas, dimensions, clusters).
    #[error("monolith count mismatch: {reason}")]
    Count {
        /// Which count is off.
        reason: String,
    },

    /// Thresholds are not strictly decreasing.
    #[error("thresholds not monotone: {reason}")]
    ThresholdOrder {
        /// Description of the ordering violation.
        reason: String,
    },

    /// Cluster membership does not partition the policy areas.
    #[error("cluster membership defect: {reason}")]
    ClusterMembership {
        /// Description of the defect.
        reason: String,
    },

    /// Positional layout broken (question -> (PA, slot) mapping).
    #[error("positional layout defect: {reason}")]
    Layout {
        /// Description of the defect.
        reason: String,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

// Implement From traits for standard library and ecosystem errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::InvalidState {
            message: format!("regex error: {err}"),
        }
    }
}
