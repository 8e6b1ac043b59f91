use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WayfindError};

/// Top-level Wayfind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub fallback_models: Vec<ModelConfig>,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_provider() -> String { "anthropic".to_string() }
fn default_max_tokens() -> u32 { 1024 }
fn default_temperature() -> f32 { 0.0 }

/// Retry configuration for completion requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff() -> u64 { 1000 }
fn default_max_backoff() -> u64 { 30000 }

/// Search collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of documents requested per retrieval.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Path to the SQLite index file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            db_path: default_db_path(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

fn default_top_k() -> usize { 4 }
fn default_db_path() -> String { "wayfind-index.db".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "openai", "ollama", or any OpenAI-compatible API.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Model name (e.g., "text-embedding-3-small", "nomic-embed-text").
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Base URL for the embedding API (e.g., "http://localhost:11434/v1").
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key (optional, for cloud providers).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Embedding dimensions (default: 1536).
    #[serde(default = "default_embedding_dims")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: None,
            api_key: None,
            dimensions: default_embedding_dims(),
        }
    }
}

fn default_embedding_provider() -> String { "openai".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-small".to_string() }
fn default_embedding_dims() -> usize { 1536 }

/// Which end of the score range means "more similar".
///
/// Cosine-similarity backends report higher-is-better; distance-based
/// backends report lower-is-better. The gate never assumes either.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOrder {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

/// Retrieval quality gate policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum number of qualifying items for an `ok` verdict.
    #[serde(default = "default_min_items")]
    pub min_items: usize,
    /// Score threshold an item must pass to qualify. Unset = every item
    /// qualifies, so any non-empty retrieval passes the gate.
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub score_order: ScoreOrder,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_items: default_min_items(),
            min_score: None,
            score_order: ScoreOrder::default(),
        }
    }
}

fn default_min_items() -> usize { 1 }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| WayfindError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| WayfindError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_WAYFIND_VAR", "hello");
        let result = expand_env_vars("key = \"${TEST_WAYFIND_VAR}\"");
        assert_eq!(result, "key = \"hello\"");
        std::env::remove_var("TEST_WAYFIND_VAR");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("key = \"${NONEXISTENT_WAYFIND_VAR}\"");
        assert_eq!(result, "key = \"${NONEXISTENT_WAYFIND_VAR}\"");
    }

    #[test]
    fn test_defaults_from_minimal_toml() {
        let toml_str = r#"
[model]
model_id = "claude-sonnet-4-20250514"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.provider, "anthropic");
        assert_eq!(config.model.max_tokens, 1024);
        assert_eq!(config.model.temperature, 0.0);
        assert!(config.fallback_models.is_empty());
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.gate.min_items, 1);
        assert!(config.gate.min_score.is_none());
        assert_eq!(config.gate.score_order, ScoreOrder::HigherIsBetter);
    }

    #[test]
    fn test_gate_section() {
        let toml_str = r#"
[model]
model_id = "llama3.1"
provider = "ollama"

[gate]
min_items = 2
min_score = 0.35
score_order = "lower_is_better"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gate.min_items, 2);
        assert_eq!(config.gate.min_score, Some(0.35));
        assert_eq!(config.gate.score_order, ScoreOrder::LowerIsBetter);
    }

    #[test]
    fn test_retrieval_embedding_section() {
        let toml_str = r#"
[model]
model_id = "llama3.1"

[retrieval]
top_k = 6
db_path = "/tmp/wayfind-test.db"

[retrieval.embedding]
provider = "ollama"
model = "nomic-embed-text"
base_url = "http://localhost:11434/v1"
dimensions = 768
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.retrieval.embedding.model, "nomic-embed-text");
        assert_eq!(config.retrieval.embedding.dimensions, 768);
    }
}
