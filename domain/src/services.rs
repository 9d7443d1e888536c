//! Seams to the external model runtime.
//!
//! Infrastructure provides the Ollama-backed implementations; tests swap in
//! deterministic doubles.

use std::future::Future;

use crate::error::LabResult;
use crate::models::{Generation, GenerationOptions};

/// Turns text into fixed-length vectors.
pub trait EmbeddingModel {
    /// One vector per input, in input order. Empty inputs are rejected with
    /// `InvalidInput`; failures are never retried.
    fn embed(&self, texts: &[String]) -> impl Future<Output = LabResult<Vec<Vec<f32>>>> + Send;
}

/// Sends a prompt to a language model and waits for the full answer.
pub trait LanguageModel {
    fn generate(
        &self,
        prompt: &str,
        model_id: &str,
        options: &GenerationOptions,
    ) -> impl Future<Output = LabResult<Generation>> + Send;
}
