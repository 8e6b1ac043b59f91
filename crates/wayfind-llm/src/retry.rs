use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{info, warn};

use wayfind_core::config::{ModelConfig, RetryConfig};
use wayfind_core::error::{Result, WayfindError};
use wayfind_core::traits::CompletionClient;

/// A completion client that retries failed requests and falls back to
/// alternative models.
pub struct RetryingClient {
    primary: Box<dyn CompletionClient>,
    fallbacks: Vec<(ModelConfig, Box<dyn CompletionClient>)>,
    retry_config: RetryConfig,
}

impl RetryingClient {
    pub fn new(
        primary: Box<dyn CompletionClient>,
        fallbacks: Vec<(ModelConfig, Box<dyn CompletionClient>)>,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            primary,
            fallbacks,
            retry_config,
        }
    }
}

fn is_retryable(e: &WayfindError) -> bool {
    match e {
        WayfindError::UpstreamCompletion(msg) => {
            msg.contains("429")
                || msg.contains("500")
                || msg.contains("502")
                || msg.contains("503")
                || msg.contains("timeout")
                || msg.contains("connection")
        }
        _ => false,
    }
}

fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let ms = (config.initial_backoff_ms * 2u64.pow(attempt)).min(config.max_backoff_ms);
    // Add jitter: 0.8x to 1.2x
    let jitter = 0.8 + rand::random::<f64>() * 0.4;
    Duration::from_millis((ms as f64 * jitter) as u64)
}

impl CompletionClient for RetryingClient {
    fn complete(
        &self,
        config: &ModelConfig,
        system: &str,
        user: &str,
    ) -> BoxFuture<'_, Result<String>> {
        let config = config.clone();
        let system = system.to_string();
        let user = user.to_string();

        Box::pin(async move {
            let max_retries = self.retry_config.max_retries;

            // Try primary with retries
            let mut last_err = None;
            for attempt in 0..=max_retries {
                match self.primary.complete(&config, &system, &user).await {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        if is_retryable(&e) && attempt < max_retries {
                            let backoff = calculate_backoff(attempt, &self.retry_config);
                            warn!(
                                attempt = attempt + 1,
                                max_retries,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Retrying completion request"
                            );
                            tokio::time::sleep(backoff).await;
                            last_err = Some(e);
                            continue;
                        }
                        last_err = Some(e);
                        break;
                    }
                }
            }

            // Primary exhausted — try fallbacks
            if !self.fallbacks.is_empty() {
                info!("Primary model exhausted, trying fallback models");
            }
            for (fb_config, fb_client) in &self.fallbacks {
                match fb_client.complete(fb_config, &system, &user).await {
                    Ok(text) => {
                        info!(
                            model = %fb_config.model_id,
                            provider = %fb_config.provider,
                            "Fell back to alternative model"
                        );
                        return Ok(text);
                    }
                    Err(e) => {
                        warn!(
                            model = %fb_config.model_id,
                            error = %e,
                            "Fallback model also failed"
                        );
                        continue;
                    }
                }
            }

            Err(last_err
                .unwrap_or_else(|| WayfindError::UpstreamCompletion("All providers failed".into())))
        })
    }
}
