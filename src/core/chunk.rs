//! Chunk representation for the ingested plan document.
//!
//! A chunk is one (policy area, dimension) textual fragment of the input
//! document, produced by the ingestion collaborator. Exactly 60 chunks
//! exist per run and together they tile the full 10x6 grid.

use crate::core::ids::{Dimension, PolicyArea, chunk_id};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One (policy area, dimension) fragment of the plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Policy area coordinate.
    pub policy_area: PolicyArea,

    /// Dimension coordinate.
    pub dimension: Dimension,

    /// Chunk text.
    pub text: String,

    /// Byte range in the extracted document, when the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_range: Option<Range<usize>>,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub const fn new(policy_area: PolicyArea, dimension: Dimension, text: String) -> Self {
        Self {
            policy_area,
            dimension,
            text,
            byte_range: None,
        }
    }

    /// Creates a chunk carrying its byte range in the source document.
    #[must_use]
    pub const fn with_byte_range(
        policy_area: PolicyArea,
        dimension: Dimension,
        text: String,
        byte_range: Range<usize>,
    ) -> Self {
        Self {
            policy_area,
            dimension,
            text,
            byte_range: Some(byte_range),
        }
    }

    /// Canonical chunk identifier ("PA01-DIM01").
    #[must_use]
    pub fn id(&self) -> String {
        chunk_id(self.policy_area, self.dimension)
    }

    /// Returns the size of the chunk text in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.text.len()
    }

    /// Checks if the chunk has no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_new() {
        let chunk = Chunk::new(PolicyArea::Pa01, Dimension::Dim01, "contenido".to_string());
        assert_eq!(chunk.id(), "PA01-DIM01");
        assert_eq!(chunk.size(), 9);
        assert!(!chunk.is_empty());
        assert!(chunk.byte_range.is_none());
    }

    #[test]
    fn test_chunk_with_byte_range() {
        let chunk = Chunk::with_byte_range(
            PolicyArea::Pa02,
            Dimension::Dim03,
            "texto".to_string(),
            100..105,
        );
        assert_eq!(chunk.byte_range, Some(100..105));
        assert_eq!(chunk.id(), "PA02-DIM03");
    }

    #[test]
    fn test_chunk_whitespace_is_empty() {
        let chunk = Chunk::new(PolicyArea::Pa01, Dimension::Dim01, "   \n ".to_string());
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_chunk_serialization() {
        let chunk = Chunk::new(PolicyArea::Pa05, Dimension::Dim06, "x".to_string());
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("\"PA05\""));
        assert!(json.contains("\"DIM06\""));
        let back: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }
}
