use crate::config::AppConfig;
use crate::error::RecipeError;
use crate::providers::{LlmProvider, ProviderFactory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

pub struct FallbackProvider {
    providers: Vec<Box<dyn LlmProvider>>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl FallbackProvider {
    /// Create a new fallback provider from configuration
    pub fn new(config: &AppConfig) -> Result<Self, RecipeError> {
        if !config.fallback.enabled {
            // If fallback is disabled, just use the default provider
            let default_provider = ProviderFactory::get_default_provider(config)?;
            return Ok(FallbackProvider {
                providers: vec![default_provider],
                retry_attempts: 1,
                retry_delay_ms: 0,
            });
        }

        let timeout = Duration::from_secs(config.timeout);
        let mut providers = Vec::new();

        // Create providers in fallback order
        for provider_name in &config.fallback.order {
            let provider_config = config.provider_config(provider_name);
            if !provider_config.enabled {
                debug!("Skipping disabled provider '{}'", provider_name);
                continue;
            }
            match ProviderFactory::create(provider_name, &provider_config, timeout) {
                Ok(provider) => {
                    info!("Added '{}' to fallback chain", provider_name);
                    providers.push(provider);
                }
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", provider_name, e);
                }
            }
        }

        if providers.is_empty() {
            return Err(RecipeError::Provider(
                "No providers available in fallback configuration".to_string(),
            ));
        }

        Ok(FallbackProvider {
            providers,
            retry_attempts: config.fallback.retry_attempts.max(1),
            retry_delay_ms: config.fallback.retry_delay_ms,
        })
    }

    /// Build a chain directly from provider instances
    pub fn from_providers(
        providers: Vec<Box<dyn LlmProvider>>,
        retry_attempts: u32,
        retry_delay_ms: u64,
    ) -> Self {
        FallbackProvider {
            providers,
            retry_attempts: retry_attempts.max(1),
            retry_delay_ms,
        }
    }

    /// Try a provider, backing off a little longer after each failure
    async fn try_provider_with_retry(
        &self,
        provider: &dyn LlmProvider,
        prompt: &str,
    ) -> Result<String, RecipeError> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!(
                "Attempting generation with {} (attempt {}/{})",
                provider.provider_name(),
                attempt,
                self.retry_attempts
            );

            match provider.generate(prompt).await {
                Ok(text) => {
                    info!("Generated reply using {}", provider.provider_name());
                    return Ok(text);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed (attempt {}/{}): {}",
                        provider.provider_name(),
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }

            if attempt < self.retry_attempts {
                let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
                debug!("Waiting {:?} before retry", delay);
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            RecipeError::Generation(format!("{} was never attempted", provider.provider_name()))
        }))
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    fn provider_name(&self) -> &str {
        match self.providers.as_slice() {
            [only] => only.provider_name(),
            _ => "fallback",
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, RecipeError> {
        let mut all_errors: Vec<String> = Vec::new();

        for provider in &self.providers {
            match self.try_provider_with_retry(provider.as_ref(), prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    all_errors.push(format!("{}: {}", provider.provider_name(), e));
                }
            }
        }

        Err(RecipeError::Generation(format!(
            "All providers failed:\n{}",
            all_errors.join("\n")
        )))
    }
}
