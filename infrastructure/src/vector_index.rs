//! Brute-force in-memory vector index with cosine similarity.

use std::collections::HashMap;

use domain::models::RetrievedChunk;
use domain::{LabError, LabResult};

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk_id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub source: String,
    norm: f32,
}

/// Chunk vectors in insertion order.
///
/// The dimensionality is fixed at construction or by the first insert and
/// never changes afterwards, not even by [`VectorIndex::clear`].
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dimension: Option<usize>,
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(dimension: usize) -> LabResult<Self> {
        if dimension == 0 {
            return Err(LabError::InvalidConfiguration(
                "index dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimension: Some(dimension),
            ..Self::default()
        })
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    /// Add a chunk. Re-inserting a known `chunk_id` replaces its payload but
    /// keeps its original position for tie-breaking.
    pub fn insert(
        &mut self,
        chunk_id: impl Into<String>,
        vector: Vec<f32>,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> LabResult<()> {
        validate_values(&vector)?;
        self.check_dimension(vector.len())?;
        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }

        let entry = IndexEntry {
            chunk_id: chunk_id.into(),
            norm: l2_norm(&vector),
            vector,
            text: text.into(),
            source: source.into(),
        };
        match self.positions.get(&entry.chunk_id) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.positions
                    .insert(entry.chunk_id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    /// The `min(k, len)` most similar chunks, best first. Equal scores keep
    /// insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> LabResult<Vec<RetrievedChunk>> {
        if self.dimension.is_none() {
            return Ok(Vec::new());
        }
        validate_values(vector)?;
        self.check_dimension(vector.len())?;

        let query_norm = l2_norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine(vector, query_norm, &entry.vector, entry.norm)))
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let entry = &self.entries[i];
                RetrievedChunk {
                    chunk_id: entry.chunk_id.clone(),
                    text: entry.text.clone(),
                    source: entry.source.clone(),
                    score,
                }
            })
            .collect())
    }

    fn check_dimension(&self, actual: usize) -> LabResult<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(LabError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

/// 0.0 when either vector has zero magnitude.
fn cosine(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot_product / (norm_a * norm_b)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn validate_values(vector: &[f32]) -> LabResult<()> {
    if vector.is_empty() {
        return Err(LabError::InvalidInput("vector must not be empty".to_string()));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(LabError::InvalidInput(
            "vector contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}
