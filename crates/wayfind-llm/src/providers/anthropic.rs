use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use wayfind_core::config::ModelConfig;
use wayfind_core::error::{Result, WayfindError};
use wayfind_core::traits::CompletionClient;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
}

impl AnthropicClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

// Anthropic API request types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

// Anthropic API response types
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl CompletionClient for AnthropicClient {
    fn complete(
        &self,
        config: &ModelConfig,
        system: &str,
        user: &str,
    ) -> BoxFuture<'_, Result<String>> {
        let url = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());
        let api_key = config.api_key.clone().unwrap_or_default();

        let request = AnthropicRequest {
            model: config.model_id.clone(),
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
            system: (!system.is_empty()).then(|| system.to_string()),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        Box::pin(async move {
            debug!(model = %request.model, "Sending Anthropic completion request");

            let resp = self
                .http
                .post(&url)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request)
                .send()
                .await
                .map_err(|e| WayfindError::UpstreamCompletion(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(WayfindError::UpstreamCompletion(format!(
                    "Anthropic API error {}: {}",
                    status, body
                )));
            }

            let body: AnthropicResponse = resp
                .json()
                .await
                .map_err(|e| WayfindError::CompletionParse(e.to_string()))?;

            let text: String = body
                .content
                .iter()
                .filter_map(|b| match b {
                    ResponseBlock::Text { text } => Some(text.as_str()),
                    ResponseBlock::Other => None,
                })
                .collect::<Vec<_>>()
                .join("");

            Ok(text)
        })
    }
}
