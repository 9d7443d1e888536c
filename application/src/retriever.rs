use domain::models::RetrievedChunk;
use domain::services::EmbeddingModel;
use domain::{LabError, LabResult};
use infrastructure::vector_index::VectorIndex;
use tracing::debug;

pub const DEFAULT_TOP_K: usize = 3;

/// Embeds a question and looks up its nearest chunks.
pub struct Retriever<'a, E> {
    embedder: &'a E,
    index: &'a VectorIndex,
}

impl<'a, E: EmbeddingModel> Retriever<'a, E> {
    pub fn new(embedder: &'a E, index: &'a VectorIndex) -> Self {
        Self { embedder, index }
    }

    pub async fn retrieve(&self, question: &str, k: usize) -> LabResult<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(LabError::InvalidInput("k must be at least 1".to_string()));
        }
        let mut vectors = self.embedder.embed(&[question.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(LabError::UnexpectedResponse(format!(
                "expected one question embedding, got {}",
                vectors.len()
            )));
        }
        let query = vectors.remove(0);
        let hits = self.index.query(&query, k)?;
        debug!(k, hits = hits.len(), "retrieved chunks");
        Ok(hits)
    }
}
