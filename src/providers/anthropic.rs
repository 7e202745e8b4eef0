use crate::config::ProviderConfig;
use crate::error::RecipeError;
use crate::providers::{http_client, read_json, resolve_api_key, resolve_base_url, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, RecipeError> {
        let api_key = resolve_api_key(config, &["ANTHROPIC_API_KEY"])?;

        Ok(AnthropicProvider {
            client: http_client(timeout)?,
            api_key,
            base_url: resolve_base_url(config, DEFAULT_BASE_URL),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, prompt: &str) -> Result<String, RecipeError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt
                    }
                ]
            }))
            .send()
            .await?;

        let response_body = read_json(self.provider_name(), response).await?;
        debug!("{:?}", response_body);

        let text = response_body["content"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                RecipeError::Generation(
                    "Failed to extract content from Anthropic response".to_string(),
                )
            })?
            .to_string();

        Ok(text)
    }
}
