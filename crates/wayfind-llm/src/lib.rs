pub mod providers;
pub mod retry;

use wayfind_core::config::ModelConfig;
use wayfind_core::traits::CompletionClient;

pub use providers::anthropic::AnthropicClient;
pub use providers::openai::OpenAiClient;
pub use retry::RetryingClient;

/// Create a completion client based on the provider name.
pub fn create_client(config: &ModelConfig) -> Box<dyn CompletionClient> {
    match config.provider.as_str() {
        "anthropic" | "claude" => Box::new(AnthropicClient::new()),
        // Everything else uses the OpenAI-compatible client
        _ => Box::new(OpenAiClient::new()),
    }
}
