//! Renders the final prompt string sent to the model.
//!
//! Everything here is a pure function of its arguments.

use crate::session::ConversationTurn;
use crate::technique::{PromptTechnique, RagTechnique, Technique};

pub const CONTEXT_SEPARATOR: &str = "\n\n";

const STEP_BY_STEP: &str = "Let's think step by step.";
const CHAT_PREAMBLE: &str = "You are a helpful, concise assistant.\n";

/// Build the prompt for `technique`.
///
/// Lab techniques ignore `context`. RAG techniques join it with a blank line;
/// a missing context renders as an empty context section.
pub fn compose(technique: Technique, question: &str, context: Option<&[String]>) -> String {
    match technique {
        Technique::Lab(t) => compose_lab(t, question),
        Technique::Rag(t) => {
            let joined = context.map(|c| c.join(CONTEXT_SEPARATOR)).unwrap_or_default();
            compose_rag(t, question, &joined)
        }
    }
}

fn compose_lab(technique: PromptTechnique, prompt: &str) -> String {
    match technique {
        PromptTechnique::ZeroShot => prompt.to_string(),
        PromptTechnique::OneShot => format!(
            "Use the example in the prompt as the pattern for your answer.\n\n{prompt}"
        ),
        PromptTechnique::FewShot => format!(
            "Continue the pattern established by the examples below.\n\n{prompt}"
        ),
        PromptTechnique::ChainOfThought => format!(
            "Reason through the problem one step at a time, then state the final answer.\n\n{}",
            with_step_cue(prompt)
        ),
        PromptTechnique::ZeroShotCot => with_step_cue(prompt),
        PromptTechnique::Role => {
            if starts_with_ignore_case(prompt, "you are") {
                prompt.to_string()
            } else {
                format!("You are an expert in the subject of this request. Answer with that expertise.\n\n{prompt}")
            }
        }
        PromptTechnique::Template => {
            if has_placeholder(prompt) {
                prompt.to_string()
            } else {
                format!(
                    "{prompt}\n\nFormat the answer as:\nSummary: [one sentence]\nDetails: [key points]\nAnswer: [direct answer]"
                )
            }
        }
        PromptTechnique::System => {
            if starts_with_ignore_case(prompt, "system:") {
                prompt.to_string()
            } else {
                format!(
                    "SYSTEM: You are a helpful assistant. Be polite, accurate and concise.\nUSER: {prompt}"
                )
            }
        }
    }
}

fn compose_rag(technique: RagTechnique, question: &str, context: &str) -> String {
    match technique {
        RagTechnique::Standard => {
            format!("Context: {context}\n\nQuestion: {question}\n\nAnswer:")
        }
        RagTechnique::ChainOfThought => format!(
            "Context: {context}\n\nQuestion: {question}\n\nLet's think step by step:\nAnswer:"
        ),
        RagTechnique::RoleBased => format!(
            "You are a research assistant. Context: {context}\n\nQuestion: {question}\n\nAnswer:"
        ),
        RagTechnique::Template => format!(
            "Context: {context}\n\nQuestion: {question}\n\n**Key Info:** [from context]\n**Answer:** [direct answer]"
        ),
    }
}

/// Plain chat transcript: preamble, every prior turn, then the new input.
pub fn compose_chat(history: &[ConversationTurn], input: &str) -> String {
    let mut prompt = String::from(CHAT_PREAMBLE);
    for turn in history {
        prompt.push_str(&format!("User: {}\nBot: {}\n", turn.prompt, turn.answer));
    }
    prompt.push_str(&format!("User: {input}\nBot:"));
    prompt
}

fn with_step_cue(prompt: &str) -> String {
    if prompt.to_lowercase().contains("step by step") {
        prompt.to_string()
    } else {
        format!("{prompt}\n\n{STEP_BY_STEP}")
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.trim_start()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn has_placeholder(text: &str) -> bool {
    text.find('[')
        .is_some_and(|open| text[open..].contains(']'))
}
