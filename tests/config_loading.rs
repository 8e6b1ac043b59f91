use std::io::Write;

use wayfind_core::config::{AppConfig, ScoreOrder};

#[test]
fn test_load_full_config_from_file() {
    let toml_content = r#"
[model]
provider = "anthropic"
model_id = "claude-sonnet-4-20250514"
api_key = "sk-test-key"
max_tokens = 4096
temperature = 0.5

[model.retry]
max_retries = 2
initial_backoff_ms = 250

[[fallback_models]]
provider = "ollama"
model_id = "llama3.1"
base_url = "http://localhost:11434/v1"

[retrieval]
top_k = 6
db_path = "/tmp/wayfind-test-index.db"

[retrieval.embedding]
provider = "ollama"
model = "nomic-embed-text"
base_url = "http://localhost:11434/v1"
dimensions = 768

[gate]
min_items = 2
min_score = 0.4
score_order = "higher_is_better"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.model.provider, "anthropic");
    assert_eq!(config.model.model_id, "claude-sonnet-4-20250514");
    assert_eq!(config.model.api_key, Some("sk-test-key".to_string()));
    assert_eq!(config.model.max_tokens, 4096);
    assert_eq!(config.model.temperature, 0.5);

    let retry = config.model.retry.expect("retry section");
    assert_eq!(retry.max_retries, 2);
    assert_eq!(retry.initial_backoff_ms, 250);
    // Unspecified retry field keeps its default.
    assert_eq!(retry.max_backoff_ms, 30000);

    assert_eq!(config.fallback_models.len(), 1);
    assert_eq!(config.fallback_models[0].provider, "ollama");
    assert_eq!(
        config.fallback_models[0].base_url.as_deref(),
        Some("http://localhost:11434/v1")
    );

    assert_eq!(config.retrieval.top_k, 6);
    assert_eq!(config.retrieval.db_path, "/tmp/wayfind-test-index.db");
    assert_eq!(config.retrieval.embedding.model, "nomic-embed-text");
    assert_eq!(config.retrieval.embedding.dimensions, 768);

    assert_eq!(config.gate.min_items, 2);
    assert_eq!(config.gate.min_score, Some(0.4));
    assert_eq!(config.gate.score_order, ScoreOrder::HigherIsBetter);
}

#[test]
fn test_missing_config_file() {
    let err = AppConfig::load(std::path::Path::new("/nonexistent/wayfind.toml")).unwrap_err();
    assert!(matches!(
        err,
        wayfind_core::error::WayfindError::ConfigNotFound(_)
    ));
}
