use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use shared::types::Result;
use std::env;
use std::str::FromStr;

use crate::chunker::ChunkingConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub embed_model: String,
    pub db_path: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Config {
    /// Read `.env` (if any), then the process environment.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ollama_model =
            lookup("OLLAMA_MODEL").unwrap_or_else(|| "llama3.2:3b".to_string());
        let config = Self {
            ollama_base_url: lookup("OLLAMA_BASE_URL")
                .unwrap_or_else(|| "http://localhost:11434".to_string())
                .trim_end_matches('/')
                .to_string(),
            embed_model: lookup("OLLAMA_EMBED_MODEL").unwrap_or_else(|| ollama_model.clone()),
            ollama_model,
            db_path: lookup("DB_PATH").unwrap_or_else(|| "prompt_lab_index.db".to_string()),
            chunk_size: parse_or(&lookup, "CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_or(&lookup, "CHUNK_OVERLAP", 200)?,
            top_k: parse_or(&lookup, "TOP_K", 3)?,
        };
        config.chunking()?;
        if config.top_k == 0 {
            return Err(anyhow!("TOP_K must be at least 1"));
        }
        Ok(config)
    }

    pub fn chunking(&self) -> Result<ChunkingConfig> {
        Ok(ChunkingConfig::new(self.chunk_size, self.chunk_overlap)?)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}
