//! Deterministic stand-ins for the model runtime.

use std::sync::Mutex;
use std::time::Duration;

use domain::models::{Generation, GenerationOptions};
use domain::services::{EmbeddingModel, LanguageModel};
use domain::{LabError, LabResult};

const AXES: [&str; 3] = ["apple", "banana", "cherr"];

/// One-hot embeddings: texts mentioning a known fruit land on that fruit's
/// axis, anything else on the axis picked by its length.
pub struct AxisEmbedder {
    dimension: usize,
    failure: Option<LabError>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl AxisEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: LabError) -> Self {
        Self {
            failure: Some(err),
            ..Self::new(3)
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let axis = AXES
            .iter()
            .position(|word| lower.contains(word))
            .unwrap_or(text.len())
            % self.dimension;
        let mut vector = vec![0.0; self.dimension];
        vector[axis] = 1.0;
        vector
    }
}

impl EmbeddingModel for AxisEmbedder {
    async fn embed(&self, texts: &[String]) -> LabResult<Vec<Vec<f32>>> {
        self.calls.lock().unwrap().push(texts.to_vec());
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Answers every prompt with a fixed reply and remembers what it was asked.
pub struct ScriptedModel {
    reply: String,
    failure: Option<LabError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: LabError) -> Self {
        Self {
            failure: Some(err),
            ..Self::replying("")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    async fn generate(
        &self,
        prompt: &str,
        model_id: &str,
        _options: &GenerationOptions,
    ) -> LabResult<Generation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(Generation {
            text: self.reply.clone(),
            latency: Duration::from_millis(42),
            model: model_id.to_string(),
        })
    }
}
