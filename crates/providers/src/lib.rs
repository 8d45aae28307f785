//! LLM Provider implementations for agromie.
//!
//! All providers implement the `agromie_core::Provider` trait.
//! [`build_from_config`] assembles the configured backend behind a
//! [`RetryProvider`].

pub mod openai_compat;
pub mod retry;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryPolicy, RetryProvider};

use agromie_core::error::ProviderError;
use agromie_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider, wrapped with retry and timeout handling.
pub fn build_from_config(
    config: &agromie_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.default_provider.as_str();
    let base_url = config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(name));

    let api_key = match (&config.api_key, name) {
        (Some(key), _) => key.clone(),
        (None, "ollama" | "vllm" | "llamacpp") => String::new(),
        (None, _) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for '{name}' (set AGROMIE_API_KEY or api_key in config.toml)"
            )));
        }
    };

    let inner: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)?);
    let policy = RetryPolicy {
        max_retries: config.agent.max_retries,
        base_delay: Duration::from_millis(config.agent.retry_base_delay_ms),
        attempt_timeout: Duration::from_secs(config.agent.request_timeout_secs),
    };
    Ok(Arc::new(RetryProvider::new(inner, policy)))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" => "http://localhost:8080/v1".into(),
        _ => "https://openrouter.ai/api/v1".into(),
    }
}
