//! The closed set of prompt techniques offered by the lab.
//!
//! Lab techniques shape a free-form prompt; RAG techniques shape a question
//! plus retrieved context. Both are fixed at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptTechnique {
    ZeroShot,
    OneShot,
    FewShot,
    ChainOfThought,
    ZeroShotCot,
    Role,
    Template,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RagTechnique {
    Standard,
    ChainOfThought,
    RoleBased,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technique {
    Lab(PromptTechnique),
    Rag(RagTechnique),
}

impl PromptTechnique {
    pub const ALL: [PromptTechnique; 8] = [
        PromptTechnique::ZeroShot,
        PromptTechnique::OneShot,
        PromptTechnique::FewShot,
        PromptTechnique::ChainOfThought,
        PromptTechnique::ZeroShotCot,
        PromptTechnique::Role,
        PromptTechnique::Template,
        PromptTechnique::System,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PromptTechnique::ZeroShot => "Zero-Shot Prompting",
            PromptTechnique::OneShot => "One-Shot Prompting",
            PromptTechnique::FewShot => "Few-Shot Prompting",
            PromptTechnique::ChainOfThought => "Chain-of-Thought",
            PromptTechnique::ZeroShotCot => "Zero-Shot CoT",
            PromptTechnique::Role => "Role Prompting",
            PromptTechnique::Template => "Template Prompting",
            PromptTechnique::System => "System Prompting",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            PromptTechnique::ZeroShot => "zero-shot",
            PromptTechnique::OneShot => "one-shot",
            PromptTechnique::FewShot => "few-shot",
            PromptTechnique::ChainOfThought => "cot",
            PromptTechnique::ZeroShotCot => "zero-shot-cot",
            PromptTechnique::Role => "role",
            PromptTechnique::Template => "template",
            PromptTechnique::System => "system",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PromptTechnique::ZeroShot => "Ask the model to perform a task without any examples",
            PromptTechnique::OneShot => "Provide one example to guide the model's response",
            PromptTechnique::FewShot => "Provide multiple examples to establish a pattern",
            PromptTechnique::ChainOfThought => "Encourage step-by-step reasoning",
            PromptTechnique::ZeroShotCot => "Add reasoning without examples",
            PromptTechnique::Role => "Assign expertise to the AI",
            PromptTechnique::Template => "Use structured formats",
            PromptTechnique::System => "Set behavioral guidelines",
        }
    }

    /// Sample prompts; the first one is the lab's default prompt.
    pub fn examples(&self) -> &'static [&'static str] {
        match self {
            PromptTechnique::ZeroShot => &[
                "Classify the sentiment: 'I love this new smartphone!'",
                "Translate to French: 'Hello, how are you today?'",
                "Write a Python function to calculate factorial",
            ],
            PromptTechnique::OneShot => &[
                "Example: Text: 'boring movie' → Sentiment: Negative\nNow: Text: 'great book' → Sentiment:",
                "Example: Task: Add numbers → Code: def add(a,b): return a+b\nNow: Task: Multiply → Code:",
            ],
            PromptTechnique::FewShot => &[
                "Q: 10 apples - 3 = ?\nA: 10-3=7 apples\nQ: 2 packs × 52 cards = ?\nA: 2×52=104 cards\nQ: 25 books - 8 + 15 = ?\nA:",
            ],
            PromptTechnique::ChainOfThought => &[
                "450 students: 60% elementary, 25% middle, rest high school. How many high schoolers? Let's think step by step.",
                "All programmers drink coffee. Some coffee drinkers work late. Do some programmers work late? Let's think step by step.",
            ],
            PromptTechnique::ZeroShotCot => &[
                "Train travels 180 miles in 3 hours. How long for 300 miles? Let's think step by step.",
            ],
            PromptTechnique::Role => &[
                "You are a senior Python developer. Explain lists vs tuples to a beginner.",
                "You are a creative writing teacher. Improve: 'The dog ran fast.'",
            ],
            PromptTechnique::Template => &[
                "Review: 'Great laptop! Fast but poor battery.'\nPros: [list]\nCons: [list]\nRating: [1-5]",
            ],
            PromptTechnique::System => &[
                "SYSTEM: You are helpful customer service. Be polite and solution-focused.\nUSER: My order is 2 weeks late!",
            ],
        }
    }

    pub fn default_prompt(&self) -> &'static str {
        self.examples()[0]
    }
}

impl RagTechnique {
    pub const ALL: [RagTechnique; 4] = [
        RagTechnique::Standard,
        RagTechnique::ChainOfThought,
        RagTechnique::RoleBased,
        RagTechnique::Template,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RagTechnique::Standard => "Standard RAG",
            RagTechnique::ChainOfThought => "CoT RAG",
            RagTechnique::RoleBased => "Role-based RAG",
            RagTechnique::Template => "Template RAG",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            RagTechnique::Standard => "standard-rag",
            RagTechnique::ChainOfThought => "cot-rag",
            RagTechnique::RoleBased => "role-rag",
            RagTechnique::Template => "template-rag",
        }
    }
}

impl Technique {
    pub fn name(&self) -> &'static str {
        match self {
            Technique::Lab(t) => t.name(),
            Technique::Rag(t) => t.name(),
        }
    }
}

impl Default for Technique {
    fn default() -> Self {
        Technique::Lab(PromptTechnique::ZeroShot)
    }
}

impl fmt::Display for PromptTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for RagTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect()
}

impl FromStr for PromptTechnique {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        let alias = match wanted.as_str() {
            "chain-of-thought" => Some(PromptTechnique::ChainOfThought),
            "zero-shot-chain-of-thought" => Some(PromptTechnique::ZeroShotCot),
            _ => None,
        };
        alias
            .or_else(|| {
                PromptTechnique::ALL
                    .into_iter()
                    .find(|t| wanted == t.slug() || wanted == normalize(t.name()))
            })
            .ok_or_else(|| LabError::InvalidInput(format!("unknown prompt technique '{s}'")))
    }
}

impl FromStr for RagTechnique {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        let alias = match wanted.as_str() {
            "standard" => Some(RagTechnique::Standard),
            "role-based-rag" | "role-based" => Some(RagTechnique::RoleBased),
            _ => None,
        };
        alias
            .or_else(|| {
                RagTechnique::ALL
                    .into_iter()
                    .find(|t| wanted == t.slug() || wanted == normalize(t.name()))
            })
            .ok_or_else(|| LabError::InvalidInput(format!("unknown RAG technique '{s}'")))
    }
}

impl FromStr for Technique {
    type Err = LabError;

    /// RAG names are tried first so that `cot-rag` never resolves to the lab CoT.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(rag) = s.parse::<RagTechnique>() {
            return Ok(Technique::Rag(rag));
        }
        s.parse::<PromptTechnique>()
            .map(Technique::Lab)
            .map_err(|_| LabError::InvalidInput(format!("unknown technique '{s}'")))
    }
}
