use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

use crate::parser::ParserOptions;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Text-generation provider used when fallback is disabled
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Fallback configuration for automatic provider switching
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Image-generation settings
    #[serde(default)]
    pub image: ImageConfig,
    /// Response parser settings
    #[serde(default)]
    pub parser: ParserOptions,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Attach images to every recipe of a weekly set
    #[serde(default)]
    pub enrich_weekly: bool,
}

/// Configuration for a specific text-generation provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model identifier; each provider has its own default
    pub model: Option<String>,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Configuration for provider fallback and retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Whether fallback is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Order of providers to try (first to last)
    #[serde(default)]
    pub order: Vec<String>,
    /// Number of retry attempts per provider before fallback
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Initial delay between retries in milliseconds (grows with each attempt)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            order: Vec::new(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Configuration for the Replicate image generator
#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
    /// Whether recipes get illustrated at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// API token (can also be set via REPLICATE_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for the predictions API
    pub base_url: Option<String>,
    /// Model version hash to run
    #[serde(default = "default_image_version")]
    pub version: String,
    #[serde(default = "default_image_size")]
    pub width: u32,
    #[serde(default = "default_image_size")]
    pub height: u32,
    #[serde(default = "default_inference_steps")]
    pub num_inference_steps: u32,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    #[serde(default = "default_scheduler")]
    pub scheduler: String,
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,
    /// Delay between status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up after this many status polls
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_key: None,
            base_url: None,
            version: default_image_version(),
            width: default_image_size(),
            height: default_image_size(),
            num_inference_steps: default_inference_steps(),
            guidance_scale: default_guidance_scale(),
            scheduler: default_scheduler(),
            negative_prompt: default_negative_prompt(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

// Default value functions
fn default_provider() -> String {
    "google".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    60
}

fn default_image_version() -> String {
    "db21e45d3f7023abc2a46ee38a23973f6dce16bb082a930b0c49861f96d1e5bf".to_string()
}

fn default_image_size() -> u32 {
    768
}

fn default_inference_steps() -> u32 {
    30
}

fn default_guidance_scale() -> f32 {
    7.5
}

fn default_scheduler() -> String {
    "K_EULER".to_string()
}

fn default_negative_prompt() -> String {
    "nsfw, inappropriate, adult content, text, watermark".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
            fallback: FallbackConfig::default(),
            image: ImageConfig::default(),
            parser: ParserOptions::default(),
            server: ServerConfig::default(),
            timeout: default_timeout(),
            enrich_weekly: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with QUIRKY__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: QUIRKY__PROVIDERS__GOOGLE__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// Settings for `name`, or an enabled default entry when the provider is
    /// not listed so that API keys from the environment are enough.
    pub fn provider_config(&self, name: &str) -> ProviderConfig {
        self.providers.get(name).cloned().unwrap_or_default()
    }
}

/// Load configuration from file and environment variables
///
/// See [`AppConfig::load`] for the precedence rules.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: QUIRKY__IMAGE__MAX_POLL_ATTEMPTS
        .add_source(
            Environment::with_prefix("QUIRKY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
