use domain::models::GenerationOptions;
use domain::prompt_composer::{compose, compose_chat};
use domain::services::LanguageModel;
use domain::session::ConversationTurn;
use domain::technique::{PromptTechnique, Technique};
use domain::{LabError, LabResult};
use tracing::info;

use crate::session_context::SessionContext;

/// Single prompts under a chosen technique, plus the plain chat mode.
pub struct PromptLab<G> {
    generator: G,
    options: GenerationOptions,
}

impl<G: LanguageModel> PromptLab<G> {
    pub fn new(generator: G, options: GenerationOptions) -> Self {
        Self { generator, options }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn run(
        &self,
        ctx: &mut SessionContext,
        technique: PromptTechnique,
        prompt: &str,
        model: &str,
    ) -> LabResult<ConversationTurn> {
        if prompt.trim().is_empty() {
            return Err(LabError::InvalidInput("prompt is empty".to_string()));
        }
        let technique = Technique::Lab(technique);
        let rendered = compose(technique, prompt, None);
        let turn = self.complete(&rendered, prompt, Some(technique), model).await?;
        ctx.record(turn.clone());
        Ok(turn)
    }

    /// One chat exchange, with every earlier chat turn replayed as context.
    pub async fn chat(
        &self,
        ctx: &mut SessionContext,
        input: &str,
        model: &str,
    ) -> LabResult<ConversationTurn> {
        if input.trim().is_empty() {
            return Err(LabError::InvalidInput("message is empty".to_string()));
        }
        let rendered = compose_chat(&ctx.session().chat_history(), input);
        let turn = self.complete(&rendered, input, None, model).await?;
        ctx.record(turn.clone());
        Ok(turn)
    }

    async fn complete(
        &self,
        rendered: &str,
        prompt: &str,
        technique: Option<Technique>,
        model: &str,
    ) -> LabResult<ConversationTurn> {
        let generation = self.generator.generate(rendered, model, &self.options).await?;
        info!(
            model = %generation.model,
            latency_ms = generation.latency.as_millis() as u64,
            "prompt completed"
        );
        Ok(ConversationTurn {
            technique,
            prompt: prompt.to_string(),
            answer: generation.text,
            model: generation.model,
            latency: generation.latency,
            sources: Vec::new(),
        })
    }
}
