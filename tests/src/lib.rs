//! Deterministic model doubles for the end-to-end tests.

use std::sync::Mutex;
use std::time::Duration;

use domain::models::{Generation, GenerationOptions};
use domain::services::{EmbeddingModel, LanguageModel};
use domain::{LabError, LabResult};

pub const TRIGRAM_DIMENSION: usize = 512;

/// Bag of hashed character trigrams. Identical texts embed identically and
/// texts sharing more trigrams score higher.
#[derive(Default)]
pub struct TrigramEmbedder {
    batches: Mutex<usize>,
}

impl TrigramEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> usize {
        *self.batches.lock().unwrap()
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        let mut vector = vec![0.0; TRIGRAM_DIMENSION];
        if chars.len() < 3 {
            vector[bucket(&chars)] += 1.0;
            return vector;
        }
        for gram in chars.windows(3) {
            vector[bucket(gram)] += 1.0;
        }
        vector
    }
}

fn bucket(chars: &[char]) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for c in chars {
        hash ^= *c as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    (hash % TRIGRAM_DIMENSION as u64) as usize
}

impl EmbeddingModel for TrigramEmbedder {
    async fn embed(&self, texts: &[String]) -> LabResult<Vec<Vec<f32>>> {
        *self.batches.lock().unwrap() += 1;
        texts
            .iter()
            .enumerate()
            .map(|(pos, text)| {
                if text.trim().is_empty() {
                    Err(LabError::InvalidInput(format!("text #{pos} is empty")))
                } else {
                    Ok(Self::vector(text))
                }
            })
            .collect()
    }
}

/// Replies with a fixed answer, or always fails with the given error.
pub struct FixedModel {
    outcome: Result<String, LabError>,
    prompts: Mutex<Vec<String>>,
}

impl FixedModel {
    pub fn replying(answer: &str) -> Self {
        Self {
            outcome: Ok(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: LabError) -> Self {
        Self {
            outcome: Err(err),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LanguageModel for FixedModel {
    async fn generate(
        &self,
        prompt: &str,
        model_id: &str,
        _options: &GenerationOptions,
    ) -> LabResult<Generation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let text = self.outcome.clone()?;
        Ok(Generation {
            text,
            latency: Duration::from_millis(10),
            model: model_id.to_string(),
        })
    }
}

/// Non-repetitive filler text of exactly `len` characters.
pub fn corpus(len: usize) -> String {
    const WORDS: [&str; 10] = [
        "river", "lantern", "orbit", "copper", "meadow", "signal", "harbor", "pixel", "glacier",
        "thimble",
    ];
    let mut text = String::new();
    let mut i = 0usize;
    while text.chars().count() < len {
        text.push_str(&format!("{} {} {}. ", WORDS[i % 10], WORDS[(i * 7 + 3) % 10], i));
        i += 1;
    }
    text.chars().take(len).collect()
}
