use crate::config::ProviderConfig;
use crate::error::RecipeError;
use crate::providers::{http_client, read_json, resolve_api_key, resolve_base_url, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, RecipeError> {
        let api_key = resolve_api_key(config, &["OPENAI_API_KEY"])?;

        Ok(OpenAIProvider {
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
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, RecipeError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "user", "content": prompt}
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }))
            .send()
            .await?;

        let response_body = read_json(self.provider_name(), response).await?;
        debug!("{:?}", response_body);

        let text = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                RecipeError::Generation("Failed to extract content from response".to_string())
            })?
            .to_string();

        Ok(text)
    }
}
