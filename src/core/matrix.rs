//! The 60-slot chunk matrix.
//!
//! Presents the ingestion output as a `(PolicyArea, Dimension) -> Chunk`
//! lookup with O(1) access. The constructor enforces the tiling invariant:
//! exactly 60 chunks, the full Cartesian product present exactly once, and
//! no empty text. Any violation aborts before Phase 2 begins.

use crate::core::chunk::Chunk;
use crate::core::ids::{CHUNK_COUNT, DIMENSION_COUNT, Dimension, PolicyArea};
use crate::error::{MatrixError, Result};

/// Immutable `(PA, DIM) -> Chunk` store built from ingestion output.
#[derive(Debug, Clone)]
pub struct ChunkMatrix {
    // Dense storage indexed by (pa_index * 6 + dim_index).
    slots: Vec<Chunk>,
}

impl ChunkMatrix {
    /// Builds the matrix from the ingestion output.
    ///
    /// # Errors
    ///
    /// Returns a [`MatrixError`] when the chunk set is not exactly the
    /// full 10x6 grid with non-empty text everywhere.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.len() != CHUNK_COUNT {
            return Err(MatrixError::Count {
                actual: chunks.len(),
            }
            .into());
        }

        let mut slots: Vec<Option<Chunk>> = (0..CHUNK_COUNT).map(|_| None).collect();
        for chunk in chunks {
            if chunk.is_empty() {
                return Err(MatrixError::EmptyChunk {
                    policy_area: chunk.policy_area.to_string(),
                    dimension: chunk.dimension.to_string(),
                }
                .into());
            }
            let idx = Self::slot_index(chunk.policy_area, chunk.dimension);
            if slots[idx].is_some() {
                return Err(MatrixError::DuplicateCell {
                    policy_area: chunk.policy_area.to_string(),
                    dimension: chunk.dimension.to_string(),
                }
                .into());
            }
            slots[idx] = Some(chunk);
        }

        // With 60 distinct non-duplicate cells every slot is filled, but a
        // duplicate would already have errored above, so any hole here means
        // a cell was never produced.
        let mut filled = Vec::with_capacity(CHUNK_COUNT);
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(chunk) => filled.push(chunk),
                None => {
                    let pa = PolicyArea::ALL[idx / DIMENSION_COUNT];
                    let dim = Dimension::ALL[idx % DIMENSION_COUNT];
                    return Err(MatrixError::MissingCell {
                        policy_area: pa.to_string(),
                        dimension: dim.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(Self { slots: filled })
    }

    const fn slot_index(policy_area: PolicyArea, dimension: Dimension) -> usize {
        (policy_area as usize) * DIMENSION_COUNT + (dimension as usize)
    }

    /// Looks up the chunk for a grid cell.
    #[must_use]
    pub fn get(&self, policy_area: PolicyArea, dimension: Dimension) -> &Chunk {
        &self.slots[Self::slot_index(policy_area, dimension)]
    }

    /// Iterates chunks in (PA, DIM) order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.slots.iter()
    }

    /// Number of chunks (always 60 for a constructed matrix).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false for a constructed matrix; present for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
