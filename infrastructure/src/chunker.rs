//! Sliding-window text splitter.
//!
//! Windows are measured in characters (Unicode scalar values) so a chunk
//! boundary never lands inside a UTF-8 sequence.

use domain::models::{Chunk, Document};
use domain::{LabError, LabResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    max_length: usize,
    overlap: usize,
}

impl ChunkingConfig {
    pub fn new(max_length: usize, overlap: usize) -> LabResult<Self> {
        if max_length == 0 {
            return Err(LabError::InvalidConfiguration(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= max_length {
            return Err(LabError::InvalidConfiguration(format!(
                "chunk overlap ({overlap}) must be less than chunk size ({max_length})"
            )));
        }
        Ok(Self {
            max_length,
            overlap,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.max_length - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_length: 1000,
            overlap: 200,
        }
    }
}

/// A window over the source text. Offsets are in characters, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Emit one window per start offset `0, step, 2*step, ...` below the text
    /// length. The last window may be shorter than `max_length`.
    pub fn split(&self, text: &str) -> Vec<ChunkSpan> {
        // Byte offset of every char, plus one past the end.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = bounds.len() - 1;
        let step = self.config.step();

        let mut spans = Vec::with_capacity(char_len / step + 1);
        let mut start = 0;
        while start < char_len {
            let end = (start + self.config.max_length).min(char_len);
            spans.push(ChunkSpan {
                start,
                end,
                text: text[bounds[start]..bounds[end]].to_string(),
            });
            start += step;
        }
        spans
    }

    /// Chunks of `document` with ids `{document_id}_{index}`.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        self.split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, span)| Chunk {
                id: format!("{}_{i}", document.id),
                document_id: document.id.clone(),
                start: span.start,
                end: span.end,
                text: span.text,
            })
            .collect()
    }
}

/// Validate the parameters and split `text` in one call.
pub fn split(text: &str, max_length: usize, overlap: usize) -> LabResult<Vec<ChunkSpan>> {
    let config = ChunkingConfig::new(max_length, overlap)?;
    Ok(Chunker::new(config).split(text))
}
