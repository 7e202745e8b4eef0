mod anthropic;
mod factory;
mod fallback;
mod google;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use google::GoogleProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::{build_recipe_prompt, build_weekly_prompt, WeeklyCategory, CHEF_QUIRKY_PROMPT};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::RecipeError;

/// Unified trait for all text-generation providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "google", "openai")
    fn provider_name(&self) -> &str;

    /// Send one prompt and return the whole reply text
    async fn generate(&self, prompt: &str) -> Result<String, RecipeError>;
}

/// Config key first, then the listed environment variables in order
fn resolve_api_key(config: &ProviderConfig, env_vars: &[&str]) -> Result<String, RecipeError> {
    config
        .api_key
        .clone()
        .or_else(|| env_vars.iter().find_map(|var| std::env::var(var).ok()))
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            RecipeError::Provider(format!(
                "{} not found in config or environment",
                env_vars.join(" or ")
            ))
        })
}

fn resolve_base_url(config: &ProviderConfig, default: &str) -> String {
    config
        .base_url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

fn http_client(timeout: Duration) -> Result<Client, RecipeError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Decode a JSON body, turning error statuses into generation failures
async fn read_json(provider: &str, response: Response) -> Result<Value, RecipeError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RecipeError::Generation(format!(
            "{} returned {}: {}",
            provider, status, body
        )));
    }
    Ok(response.json().await?)
}
