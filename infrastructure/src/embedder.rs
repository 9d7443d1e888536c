use std::future::Future;

use super::ollama_client::OllamaClient;
use domain::services::EmbeddingModel;
use domain::{LabError, LabResult};
use futures::stream::{self, StreamExt};
use tracing::info;

const BATCH_SIZE: usize = 32;
const MAX_IN_FLIGHT: usize = 8;

/// Ollama-backed embedding model. Requests are issued per text, a bounded
/// number at a time, and results come back in input order.
pub struct Embedder {
    client: OllamaClient,
    model: String,
}

impl Embedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingModel for Embedder {
    async fn embed(&self, texts: &[String]) -> LabResult<Vec<Vec<f32>>> {
        embed_in_batches(&self.model, texts, |text| {
            let client = self.client.clone();
            let model = self.model.clone();
            let text = text.to_string();
            async move { client.generate_embedding(&model, &text).await }
        })
        .await
    }
}

/// Runs `embed_one` over `texts` in batches of 32, at most 8 requests in
/// flight, keeping input order. Every returned vector must share one length.
async fn embed_in_batches<F, Fut>(
    model: &str,
    texts: &[String],
    embed_one: F,
) -> LabResult<Vec<Vec<f32>>>
where
    F: Fn(&str) -> Fut,
    Fut: Future<Output = LabResult<Vec<f32>>>,
{
    if let Some(pos) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(LabError::InvalidInput(format!(
            "text #{pos} is empty and cannot be embedded"
        )));
    }

    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(BATCH_SIZE) {
        info!(model, count = batch.len(), "generating embeddings");
        let futures: Vec<_> = batch.iter().map(|text| embed_one(text.as_str())).collect();
        let results = stream::iter(futures)
            .buffered(MAX_IN_FLIGHT)
            .collect::<Vec<_>>()
            .await;
        for result in results {
            embeddings.push(result?);
        }
    }

    if let Some(first) = embeddings.first() {
        let dimension = first.len();
        if let Some(bad) = embeddings.iter().find(|v| v.len() != dimension) {
            return Err(LabError::UnexpectedResponse(format!(
                "model '{model}' returned vectors of {dimension} and {} dimensions",
                bad.len()
            )));
        }
    }
    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn numbered(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("text {i}")).collect()
    }

    fn number_of(text: &str) -> usize {
        text.trim_start_matches("text ").parse().unwrap()
    }

    #[tokio::test]
    async fn test_order_kept_across_batches() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let texts = numbered(70);

        let vectors = embed_in_batches("m", &texts, |text| {
            let n = number_of(text);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // later texts finish first within a window
                tokio::time::sleep(Duration::from_millis((7 - n % 7) as u64)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(vec![n as f32, 1.0])
            }
        })
        .await
        .unwrap();

        let order: Vec<usize> = vectors.iter().map(|v| v[0] as usize).collect();
        assert_eq!(order, (0..70).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= MAX_IN_FLIGHT);
    }

    #[tokio::test]
    async fn test_inconsistent_dimensions_rejected() {
        let texts = numbered(5);
        let err = embed_in_batches("m", &texts, |text| {
            let len = if number_of(text) == 3 { 4 } else { 3 };
            async move { Ok(vec![0.5; len]) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, LabError::UnexpectedResponse(ref m) if m.contains("3 and 4")));
    }

    #[tokio::test]
    async fn test_first_failure_propagates() {
        let texts = numbered(40);
        let err = embed_in_batches("m", &texts, |text| {
            let fail = number_of(text) == 35;
            async move {
                if fail {
                    Err(LabError::ModelNotFound("m".to_string()))
                } else {
                    Ok(vec![1.0])
                }
            }
        })
        .await
        .unwrap_err();
        assert_eq!(err, LabError::ModelNotFound("m".to_string()));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let embedder = Embedder::new(OllamaClient::new("http://127.0.0.1:9"), "nomic-embed-text");
        let texts = vec!["fine".to_string(), "  ".to_string()];
        let err = embedder.embed(&texts).await.unwrap_err();
        assert!(matches!(err, LabError::InvalidInput(ref m) if m.contains("#1")));
        assert_eq!(embedder.model(), "nomic-embed-text");
    }

    #[tokio::test]
    async fn test_no_texts_no_calls() {
        let embedder = Embedder::new(OllamaClient::new("http://127.0.0.1:9"), "nomic-embed-text");
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_runtime_propagates() {
        let embedder = Embedder::new(OllamaClient::new("http://127.0.0.1:9"), "nomic-embed-text");
        let err = embedder.embed(&["hello".to_string()]).await.unwrap_err();
        assert!(matches!(err, LabError::ServiceUnavailable(_)));
    }
}
