use crate::config::{AppConfig, ProviderConfig};
use crate::error::RecipeError;
use crate::providers::{AnthropicProvider, GoogleProvider, LlmProvider, OpenAIProvider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>, RecipeError> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(RecipeError::Provider(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )));
        }

        match provider_name {
            "google" => Ok(Box::new(GoogleProvider::new(config, timeout)?)),
            "openai" => Ok(Box::new(OpenAIProvider::new(config, timeout)?)),
            "anthropic" => Ok(Box::new(AnthropicProvider::new(config, timeout)?)),
            _ => Err(RecipeError::Provider(format!(
                "Unknown provider: {}",
                provider_name
            ))),
        }
    }

    /// Get the default provider from configuration
    pub fn get_default_provider(config: &AppConfig) -> Result<Box<dyn LlmProvider>, RecipeError> {
        let provider_name = &config.default_provider;
        let provider_config = config.provider_config(provider_name);

        Self::create(
            provider_name,
            &provider_config,
            Duration::from_secs(config.timeout),
        )
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["google", "openai", "anthropic"]
    }
}
