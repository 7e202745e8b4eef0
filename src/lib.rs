pub mod config;
pub mod error;
pub mod export;
pub mod images;
pub mod model;
pub mod parser;
pub mod providers;
pub mod server;
pub mod service;

pub use config::AppConfig;
pub use error::{ParseError, RecipeError};
pub use images::{ImageGenerator, ReplicateImageGenerator};
pub use model::{ParseResult, Recipe, RecipeSetResponse, SingleRecipeResponse};
pub use parser::{IncompletePolicy, ParseMode, ParserOptions, RecipeParser, DEFAULT_DAYS};
pub use providers::{LlmProvider, WeeklyCategory};
pub use service::RecipeService;

/// Parse a saved model reply with the default parser options
pub fn parse_recipe_response(text: &str, mode: ParseMode) -> ParseResult {
    RecipeParser::default().parse(text, mode)
}

/// Generate one recipe using `config.toml` and the environment
pub async fn generate_recipe(request: &str) -> Result<SingleRecipeResponse, RecipeError> {
    let config = AppConfig::load()?;
    RecipeService::from_config(&config)?
        .generate_recipe(request)
        .await
}

/// Generate a themed weekly set using `config.toml` and the environment
pub async fn generate_weekly(category: WeeklyCategory) -> Result<RecipeSetResponse, RecipeError> {
    let config = AppConfig::load()?;
    RecipeService::from_config(&config)?
        .generate_weekly(category)
        .await
}
