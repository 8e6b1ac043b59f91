use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use wayfind_core::config::ModelConfig;
use wayfind_core::error::{Result, WayfindError};
use wayfind_core::traits::CompletionClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible client. Works with OpenAI, Ollama, vLLM, Groq, OpenRouter, etc.
pub struct OpenAiClient {
    http: Client,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

// Request types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OaiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct OaiMessage {
    role: String,
    content: String,
}

// Response types
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn resolve_url(config: &ModelConfig) -> String {
    match &config.base_url {
        Some(base) => format!("{}/chat/completions", base.trim_end_matches('/')),
        None => OPENAI_API_URL.to_string(),
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(
        &self,
        config: &ModelConfig,
        system: &str,
        user: &str,
    ) -> BoxFuture<'_, Result<String>> {
        let url = resolve_url(config);
        let api_key = config.api_key.clone();

        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(OaiMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(OaiMessage {
            role: "user".to_string(),
            content: user.to_string(),
        });

        let request = ChatRequest {
            model: config.model_id.clone(),
            messages,
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
        };

        Box::pin(async move {
            debug!(model = %request.model, url = %url, "Sending chat completion request");

            let mut req = self.http.post(&url).json(&request);
            if let Some(key) = api_key {
                req = req.bearer_auth(key);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| WayfindError::UpstreamCompletion(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(WayfindError::UpstreamCompletion(format!(
                    "Chat API error {}: {}",
                    status, body
                )));
            }

            let body: ChatResponse = resp
                .json()
                .await
                .map_err(|e| WayfindError::CompletionParse(e.to_string()))?;

            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| {
                    WayfindError::CompletionParse("response contained no choices".to_string())
                })
        })
    }
}
