use domain::models::{Generation, GenerationOptions};
use domain::services::LanguageModel;
use domain::{LabError, LabResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::telemetry::Telemetry;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize, Default)]
struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Message,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin client for the Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Arc<Client>,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate_embedding(&self, model: &str, text: &str) -> LabResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(LabError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model,
            prompt: text,
        };
        let body = self.post_json(&url, &request, model).await?;
        let response: EmbeddingResponse = serde_json::from_str(&body).map_err(|e| {
            LabError::UnexpectedResponse(format!("embedding response from {url}: {e}"))
        })?;
        if response.embedding.is_empty() {
            return Err(LabError::UnexpectedResponse(format!(
                "model '{model}' returned an empty embedding"
            )));
        }
        Ok(response.embedding)
    }

    pub async fn generate_response(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> LabResult<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = chat_request(model, prompt, options);
        let body = self.post_json(&url, &request, model).await?;
        parse_chat_body(&body)
    }

    /// Names of the models pulled into the runtime.
    pub async fn list_models(&self) -> LabResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(e, &url))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(e, &url))?;
        if !status.is_success() {
            return Err(status_error(status, &text, ""));
        }
        let tags: TagsResponse = serde_json::from_str(&text)
            .map_err(|e| LabError::UnexpectedResponse(format!("model list from {url}: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        request: &T,
        model: &str,
    ) -> LabResult<String> {
        debug!(url, model, "ollama request");
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, url))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(e, url))?;
        if !status.is_success() {
            warn!(url, model, %status, "ollama request failed");
            return Err(status_error(status, &text, model));
        }
        Ok(text)
    }
}

impl LanguageModel for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        model_id: &str,
        options: &GenerationOptions,
    ) -> LabResult<Generation> {
        if prompt.trim().is_empty() {
            return Err(LabError::InvalidInput("prompt must not be empty".to_string()));
        }
        let telemetry = Telemetry::new();
        let text = self.generate_response(model_id, prompt, options).await?;
        let latency = telemetry.elapsed();
        info!(model = model_id, latency_ms = latency.as_millis() as u64, "generation complete");
        Ok(Generation {
            text,
            latency,
            model: model_id.to_string(),
        })
    }
}

fn chat_request<'a>(model: &'a str, prompt: &str, options: &GenerationOptions) -> ChatRequest<'a> {
    let options = (options.temperature.is_some() || options.max_tokens.is_some()).then(|| {
        ModelOptions {
            temperature: options.temperature,
            num_predict: options.max_tokens,
        }
    });
    ChatRequest {
        model,
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        stream: false,
        options,
    }
}

/// Accepts a single JSON object or newline-delimited streamed chunks.
fn parse_chat_body(text: &str) -> LabResult<String> {
    let mut full_content = String::new();
    let mut parsed_any = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(chat_resp) = serde_json::from_str::<ChatResponse>(line) {
            parsed_any = true;
            full_content.push_str(&chat_resp.message.content);
            if chat_resp.done {
                break;
            }
        }
    }
    if !parsed_any {
        if let Ok(chat_resp) = serde_json::from_str::<ChatResponse>(text) {
            return Ok(chat_resp.message.content);
        }
        return Err(LabError::UnexpectedResponse(
            "chat response did not contain a message".to_string(),
        ));
    }
    Ok(full_content)
}

fn transport_error(err: reqwest::Error, url: &str) -> LabError {
    if err.is_decode() {
        LabError::UnexpectedResponse(format!("{url}: {err}"))
    } else {
        LabError::ServiceUnavailable(format!("cannot reach {url}: {err}"))
    }
}

fn status_error(status: StatusCode, body: &str, model: &str) -> LabError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());
    if status == StatusCode::NOT_FOUND || message.to_lowercase().contains("not found") {
        LabError::ModelNotFound(format!("'{model}': {message}"))
    } else if status.is_server_error() {
        LabError::ServiceUnavailable(format!("HTTP {status}: {message}"))
    } else {
        LabError::UnexpectedResponse(format!("HTTP {status}: {message}"))
    }
}
