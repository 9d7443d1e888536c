use std::collections::HashSet;

use domain::models::{Document, GenerationOptions, SourceText};
use domain::prompt_composer::compose;
use domain::services::{EmbeddingModel, LanguageModel};
use domain::session::{ConversationTurn, SourceExcerpt};
use domain::technique::{RagTechnique, Technique};
use domain::{LabError, LabResult};
use infrastructure::chunker::{Chunker, ChunkingConfig};
use infrastructure::vector_index::VectorIndex;
use shared::utils::excerpt;
use tracing::{debug, info};

use crate::retriever::{Retriever, DEFAULT_TOP_K};
use crate::session_context::SessionContext;

const EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RagSettings {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub options: GenerationOptions,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            options: GenerationOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub skipped_duplicates: usize,
    pub dimension: usize,
}

/// Ingestion and question answering over one session's documents.
pub struct RagService<E, G> {
    embedder: E,
    generator: G,
    chunker: Chunker,
    top_k: usize,
    options: GenerationOptions,
}

impl<E: EmbeddingModel, G: LanguageModel> RagService<E, G> {
    pub fn new(embedder: E, generator: G, settings: RagSettings) -> Self {
        Self {
            embedder,
            generator,
            chunker: Chunker::new(settings.chunking),
            top_k: settings.top_k,
            options: settings.options,
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rebuild the session index from `sources`.
    ///
    /// The new index replaces the old one only once every chunk is embedded;
    /// on error the session keeps whatever it had before.
    pub async fn ingest(
        &self,
        ctx: &mut SessionContext,
        sources: Vec<SourceText>,
    ) -> LabResult<IngestReport> {
        if sources.is_empty() {
            return Err(LabError::InvalidInput("no documents to ingest".to_string()));
        }

        let mut seen = HashSet::new();
        let mut skipped_duplicates = 0;
        let mut documents = Vec::new();
        let mut chunks = Vec::new();

        for source in sources {
            if source.text.trim().is_empty() {
                return Err(LabError::InvalidInput(format!(
                    "{} contains no text",
                    source.name
                )));
            }
            let hash = format!("{:x}", md5::compute(source.text.as_bytes()));
            if !seen.insert(hash.clone()) {
                debug!(source = %source.name, "skipping duplicate document");
                skipped_duplicates += 1;
                continue;
            }

            let mut document = Document {
                id: format!("doc-{}", &hash[..12]),
                source: source.name,
                format: source.format,
                text: source.text,
                content_hash: hash,
                chunk_ids: Vec::new(),
            };
            let doc_chunks: Vec<_> = self
                .chunker
                .chunk_document(&document)
                .into_iter()
                .filter(|c| !c.text.trim().is_empty())
                .collect();
            document.chunk_ids = doc_chunks.iter().map(|c| c.id.clone()).collect();
            chunks.extend(doc_chunks.into_iter().map(|c| (c, document.source.clone())));
            documents.push(document);
        }

        let texts: Vec<String> = chunks.iter().map(|(c, _)| c.text.clone()).collect();
        info!(documents = documents.len(), chunks = texts.len(), "embedding chunks");
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(LabError::UnexpectedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        let mut index = VectorIndex::new();
        for ((chunk, source), vector) in chunks.into_iter().zip(vectors) {
            index.insert(chunk.id, vector, chunk.text, source)?;
        }

        let report = IngestReport {
            documents: documents.len(),
            chunks: index.len(),
            skipped_duplicates,
            dimension: index.dimension().unwrap_or(0),
        };
        ctx.replace_index(documents, index);
        info!(
            documents = report.documents,
            chunks = report.chunks,
            dimension = report.dimension,
            "index rebuilt"
        );
        Ok(report)
    }

    /// Answer `question` from the session's documents and record the turn.
    pub async fn ask(
        &self,
        ctx: &mut SessionContext,
        question: &str,
        technique: RagTechnique,
        model: &str,
    ) -> LabResult<ConversationTurn> {
        if question.trim().is_empty() {
            return Err(LabError::InvalidInput("question is empty".to_string()));
        }
        if ctx.index().is_empty() {
            return Err(LabError::InvalidInput(
                "no documents ingested; ingest documents before asking".to_string(),
            ));
        }

        let hits = Retriever::new(&self.embedder, ctx.index())
            .retrieve(question, self.top_k)
            .await?;
        let context: Vec<String> = hits.iter().map(|h| h.text.clone()).collect();
        let technique = Technique::Rag(technique);
        let prompt = compose(technique, question, Some(&context));
        let generation = self.generator.generate(&prompt, model, &self.options).await?;

        let turn = ConversationTurn {
            technique: Some(technique),
            prompt: question.to_string(),
            answer: generation.text,
            model: generation.model,
            latency: generation.latency,
            sources: hits
                .into_iter()
                .map(|hit| SourceExcerpt {
                    excerpt: excerpt(&hit.text, EXCERPT_CHARS),
                    source: hit.source,
                    score: hit.score,
                })
                .collect(),
        };
        ctx.record(turn.clone());
        Ok(turn)
    }
}
