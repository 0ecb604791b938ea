//! Executor-to-chunk bindings: the rows of the JOIN table.

use crate::core::ids::QuestionId;
use serde::{Deserialize, Serialize};

/// Outcome of binding one question to its chunk and signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStatus {
    /// Chunk found, signals resolved, coordinates agree.
    Matched,
    /// The chunk for the question's (PA, DIM) cell is absent.
    MissingChunk,
    /// More than one chunk claims the question's cell.
    DuplicateChunk,
    /// A mandatory signal did not resolve.
    MissingSignals,
    /// The chunk's coordinates disagree with the question's.
    Mismatch,
}

impl BindingStatus {
    /// Canonical snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::MissingChunk => "missing_chunk",
            Self::DuplicateChunk => "duplicate_chunk",
            Self::MissingSignals => "missing_signals",
            Self::Mismatch => "mismatch",
        }
    }
}

/// One row of the 300-entry JOIN table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorChunkBinding {
    /// Question identifier ("Q001".."Q300").
    pub executor_contract_id: QuestionId,

    /// Chunk identifier ("PA01-DIM01").
    pub chunk_id: String,

    /// Pattern ids the contract expects.
    pub expected_patterns: Vec<String>,

    /// Signal names the contract expects.
    pub expected_signals: Vec<String>,

    /// Pattern ids actually irrigated into the task.
    pub irrigated_patterns: Vec<String>,

    /// Signal names actually resolved from the pack.
    pub irrigated_signals: Vec<String>,

    /// Binding outcome.
    pub status: BindingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(BindingStatus::Matched.as_str(), "matched");
        assert_eq!(BindingStatus::MissingChunk.as_str(), "missing_chunk");
        assert_eq!(BindingStatus::DuplicateChunk.as_str(), "duplicate_chunk");
        assert_eq!(BindingStatus::MissingSignals.as_str(), "missing_signals");
        assert_eq!(BindingStatus::Mismatch.as_str(), "mismatch");
    }

    #[test]
    fn test_serde_form() {
        let json = serde_json::to_string(&BindingStatus::MissingChunk).unwrap();
        assert_eq!(json, "\"missing_chunk\"");
    }

    #[test]
    fn test_binding_roundtrip() {
        let binding = ExecutorChunkBinding {
            executor_contract_id: QuestionId::new(42).unwrap(),
            chunk_id: "PA02-DIM03".to_string(),
            expected_patterns: vec!["p1".to_string()],
            expected_signals: vec!["s1".to_string()],
            irrigated_patterns: vec!["p1".to_string()],
            irrigated_signals: vec!["s1".to_string()],
            status: BindingStatus::Matched,
        };
        let json = serde_json::to_string(&binding).unwrap();
        let back: ExecutorChunkBinding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, binding);
    }
}
