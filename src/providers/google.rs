use crate::config::ProviderConfig;
use crate::error::RecipeError;
use crate::providers::{http_client, read_json, resolve_api_key, resolve_base_url, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, RecipeError> {
        let api_key = resolve_api_key(config, &["GEMINI_API_KEY", "GOOGLE_API_KEY"])?;

        Ok(GoogleProvider {
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
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate(&self, prompt: &str) -> Result<String, RecipeError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "parts": [{ "text": prompt }]
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_tokens
                }
            }))
            .send()
            .await?;

        let response_body = read_json(self.provider_name(), response).await?;
        debug!("{:?}", response_body);

        // A candidate may split its reply over several parts
        let text = response_body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                RecipeError::Generation(
                    "Failed to extract content from Google Gemini response".to_string(),
                )
            })?;

        Ok(text)
    }
}
