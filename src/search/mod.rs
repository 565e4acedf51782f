//! Semantic search over note embeddings.
//!
//! Brute-force cosine scan across every indexed note. At the target scale
//! (low thousands of notes) an O(notes × dimensionality) pass is cheap;
//! an approximate nearest-neighbor structure can replace the internals
//! later without changing the `search` contract.

#[cfg(test)]
mod tests;

use anyhow::Result;
use itertools::Itertools;
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::queries::EmbeddingQueries;

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub note_id: i64,
    pub score: f32,
}

/// Snapshot of all indexed (note, vector) pairs.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<(i64, Vec<f32>)>,
}

/// Cosine similarity between two vectors, or `None` when either has zero
/// norm and the measure is undefined.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

impl VectorIndex {
    #[inline]
    pub fn new(entries: Vec<(i64, Vec<f32>)>) -> Self {
        Self { entries }
    }

    /// Load a fresh snapshot of every stored embedding.
    #[inline]
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let entries = EmbeddingQueries::list_all(pool).await?;
        debug!("Loaded vector index with {} notes", entries.len());
        Ok(Self { entries })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` notes by cosine similarity to the query, highest first.
    /// Zero-norm candidates (and a zero-norm query) are excluded rather
    /// than surfacing NaN scores. Ties break toward the lower note id so
    /// identical inputs always produce identical output.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        self.entries
            .iter()
            .filter_map(|(note_id, vector)| {
                cosine_similarity(query, vector).map(|score| SearchHit {
                    note_id: *note_id,
                    score,
                })
            })
            .sorted_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then(a.note_id.cmp(&b.note_id))
            })
            .take(k)
            .collect()
    }
}
