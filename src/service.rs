use log::{debug, error, info, warn};
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::RecipeError;
use crate::images::{recipe_image_prompt, ImageGenerator, ReplicateImageGenerator};
use crate::model::{Recipe, RecipeSetResponse, SingleRecipeResponse};
use crate::parser::{ParseMode, RecipeParser};
use crate::providers::{
    build_recipe_prompt, build_weekly_prompt, FallbackProvider, LlmProvider, WeeklyCategory,
};

/// Request flow shared by the HTTP server and the CLI: prompt the model,
/// parse its reply into recipe cards and optionally illustrate them.
pub struct RecipeService {
    provider: Box<dyn LlmProvider>,
    images: Option<Box<dyn ImageGenerator>>,
    parser: RecipeParser,
    enrich_weekly: bool,
}

impl RecipeService {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        images: Option<Box<dyn ImageGenerator>>,
        parser: RecipeParser,
    ) -> Self {
        RecipeService {
            provider,
            images,
            parser,
            enrich_weekly: false,
        }
    }

    /// Also illustrate every recipe of a weekly set
    pub fn with_weekly_images(mut self, enabled: bool) -> Self {
        self.enrich_weekly = enabled;
        self
    }

    /// Wire up the provider chain, the image generator and the parser from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, RecipeError> {
        let provider = FallbackProvider::new(config)?;
        info!("Using text provider '{}'", provider.provider_name());

        let images: Option<Box<dyn ImageGenerator>> = if config.image.enabled {
            match ReplicateImageGenerator::new(&config.image, Duration::from_secs(config.timeout))
            {
                Ok(generator) => Some(Box::new(generator)),
                Err(e) => {
                    warn!("Image generation disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(RecipeService::new(
            Box::new(provider),
            images,
            RecipeParser::new(config.parser.clone()),
        )
        .with_weekly_images(config.enrich_weekly))
    }

    pub fn parser(&self) -> &RecipeParser {
        &self.parser
    }

    pub fn has_images(&self) -> bool {
        self.images.is_some()
    }

    /// Generate one recipe for a free-text dish request
    pub async fn generate_recipe(&self, request: &str) -> Result<SingleRecipeResponse, RecipeError> {
        self.generate_recipe_with(request, true).await
    }

    /// Like [`generate_recipe`](Self::generate_recipe), optionally skipping the illustration
    pub async fn generate_recipe_with(
        &self,
        request: &str,
        with_image: bool,
    ) -> Result<SingleRecipeResponse, RecipeError> {
        let request = request.trim();
        if request.is_empty() {
            return Err(RecipeError::MissingInput(
                "Please tell Chef Quirky what you'd like to cook!".to_string(),
            ));
        }

        info!("Generating recipe for '{}'", request);
        let reply = self.provider.generate(&build_recipe_prompt(request)).await?;
        debug!("Raw model reply:\n{}", reply);

        let parsed = self.parser.parse(&reply, ParseMode::SingleRecipe);
        let intro_text = parsed.intro_text;
        let mut recipe = parsed.recipes.into_iter().next().ok_or_else(|| {
            error!("No recipe found in reply for '{}'", request);
            RecipeError::UnrecognizedFormat
        })?;

        if !recipe.is_complete() {
            error!("Recipe '{}' is missing ingredients or instructions", recipe.name);
            return Err(RecipeError::IncompleteRecipe(format!(
                "'{}' has {} ingredients and {} instructions",
                recipe.name,
                recipe.ingredients.len(),
                recipe.instructions.len()
            )));
        }

        if with_image {
            self.illustrate(&mut recipe).await;
        }

        Ok(SingleRecipeResponse { intro_text, recipe })
    }

    /// Generate a themed set with one recipe per day of the week
    pub async fn generate_weekly(
        &self,
        category: WeeklyCategory,
    ) -> Result<RecipeSetResponse, RecipeError> {
        info!("Generating weekly set '{}'", category);
        let reply = self.provider.generate(&build_weekly_prompt(category)).await?;
        debug!("Raw model reply:\n{}", reply);

        let mut parsed = self.parser.parse(&reply, ParseMode::MultiRecipe);
        if parsed.is_empty() {
            error!("No recipes found in reply for '{}'", category);
            return Err(RecipeError::UnrecognizedFormat);
        }

        let found = parsed.recipes.len();
        self.parser.fill_fixed_set(&mut parsed, category.label());
        if found != parsed.recipes.len() {
            warn!(
                "Weekly set '{}' had {} recipes, adjusted to {}",
                category,
                found,
                parsed.recipes.len()
            );
        }

        if self.enrich_weekly {
            for recipe in parsed.recipes.iter_mut() {
                self.illustrate(recipe).await;
            }
        }

        Ok(RecipeSetResponse {
            intro_text: parsed.intro_text,
            recipes: parsed.recipes,
        })
    }

    /// Generate an image for an arbitrary prompt
    pub async fn generate_image(&self, prompt: &str) -> Result<String, RecipeError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(RecipeError::MissingInput("Please provide a prompt".to_string()));
        }

        let images = self.images.as_ref().ok_or_else(|| {
            RecipeError::ImageGeneration("no image generator is configured".to_string())
        })?;
        images.generate_image(prompt).await
    }

    async fn illustrate(&self, recipe: &mut Recipe) {
        let Some(images) = &self.images else {
            return;
        };

        match images.generate_image(&recipe_image_prompt(&recipe.name)).await {
            Ok(url) => {
                debug!("Image for '{}': {}", recipe.name, url);
                recipe.image_url = Some(url);
            }
            Err(e) => warn!("Could not illustrate '{}': {}", recipe.name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct CannedProvider {
        reply: String,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Self {
            CannedProvider {
                reply: reply.to_string(),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, prompt: &str) -> Result<String, RecipeError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FixedImages(Result<&'static str, &'static str>);

    #[async_trait]
    impl ImageGenerator for FixedImages {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        async fn generate_image(&self, prompt: &str) -> Result<String, RecipeError> {
            match self.0 {
                Ok(base) => Ok(format!("{}/{}", base, prompt.len())),
                Err(msg) => Err(RecipeError::ImageGeneration(msg.to_string())),
            }
        }
    }

    const PANCAKES: &str = "A fun intro.\n\n**Pancakes**\nIngredients:\n- Flour\n- Milk\nInstructions:\n1. Mix\n2. Cook";

    fn service(reply: &str, images: Option<FixedImages>) -> RecipeService {
        RecipeService::new(
            Box::new(CannedProvider::new(reply)),
            images.map(|i| Box::new(i) as Box<dyn ImageGenerator>),
            RecipeParser::default(),
        )
    }

    #[tokio::test]
    async fn test_generate_recipe_with_image() {
        let service = service(PANCAKES, Some(FixedImages(Ok("https://img"))));
        let response = service.generate_recipe("pancakes").await.unwrap();

        assert_eq!(response.intro_text, "A fun intro.");
        assert_eq!(response.recipe.name, "Pancakes");
        assert_eq!(response.recipe.ingredients, vec!["Flour", "Milk"]);
        let expected = format!("https://img/{}", recipe_image_prompt("Pancakes").len());
        assert_eq!(response.recipe.image_url, Some(expected));
    }

    #[tokio::test]
    async fn test_image_failure_is_not_fatal() {
        let service = service(PANCAKES, Some(FixedImages(Err("quota"))));
        let response = service.generate_recipe("pancakes").await.unwrap();
        assert_eq!(response.recipe.image_url, None);
    }

    #[tokio::test]
    async fn test_blank_request() {
        let service = service(PANCAKES, None);
        let err = service.generate_recipe("   ").await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Please tell Chef Quirky what you'd like to cook!");
    }

    #[tokio::test]
    async fn test_unrecognized_reply() {
        let service = service("Sorry, I only talk about the weather.", None);
        let err = service.generate_recipe("soup").await.unwrap_err();
        assert!(matches!(err, RecipeError::UnrecognizedFormat));
    }

    #[tokio::test]
    async fn test_incomplete_recipe() {
        let service = service("**Toast**\nIngredients:\n- Bread", None);
        let err = service.generate_recipe("toast").await.unwrap_err();
        assert!(matches!(err, RecipeError::IncompleteRecipe(_)));
        assert!(err.to_string().contains("Toast"));
    }

    #[tokio::test]
    async fn test_weekly_pads_to_seven() {
        let reply = "Week ahead!\n\n**Monday: Soup**\nIngredients:\n- Water\nInstructions:\n1. Boil\n\n**Tuesday: Stew**\nIngredients:\n- Beef\nInstructions:\n1. Simmer";
        let service = service(reply, Some(FixedImages(Ok("https://img"))));
        let response = service.generate_weekly(WeeklyCategory::Cakes).await.unwrap();

        assert_eq!(response.recipes.len(), 7);
        assert_eq!(response.recipes[0].name, "Soup");
        assert_eq!(response.recipes[2].name, "Placeholder Cake 3");
        assert_eq!(response.recipes[2].day, "Wednesday");
        // weekly enrichment is off by default
        assert!(response.recipes.iter().all(|r| r.image_url.is_none()));
    }

    #[tokio::test]
    async fn test_weekly_enrichment() {
        let reply = "**Monday: Soup**\nIngredients:\n- Water\nInstructions:\n1. Boil";
        let service =
            service(reply, Some(FixedImages(Ok("https://img")))).with_weekly_images(true);
        let response = service.generate_weekly(WeeklyCategory::Dinners).await.unwrap();
        assert!(response.recipes.iter().all(|r| r.image_url.is_some()));
    }

    #[tokio::test]
    async fn test_weekly_without_recipes() {
        let service = service("I forgot the recipes.", None);
        let err = service.generate_weekly(WeeklyCategory::Cocktails).await.unwrap_err();
        assert!(matches!(err, RecipeError::UnrecognizedFormat));
    }

    #[tokio::test]
    async fn test_prompts_sent_to_provider() {
        let provider = CannedProvider::new(PANCAKES);
        let prompts = provider.prompts.clone();
        let service = RecipeService::new(Box::new(provider), None, RecipeParser::default());
        service.generate_recipe("  pancakes ").await.unwrap();
        service.generate_weekly(WeeklyCategory::Cocktails).await.ok();

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], build_recipe_prompt("pancakes"));
        assert_eq!(prompts[1], build_weekly_prompt(WeeklyCategory::Cocktails));
    }

    #[tokio::test]
    async fn test_generate_image() {
        let service = service(PANCAKES, Some(FixedImages(Ok("https://img"))));
        assert_eq!(service.generate_image(" cat ").await.unwrap(), "https://img/3");

        let err = service.generate_image("").await.unwrap_err();
        assert_eq!(err.to_string(), "Please provide a prompt");
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_generate_image_unconfigured() {
        let service = service(PANCAKES, None);
        assert!(!service.has_images());
        let err = service.generate_image("cat").await.unwrap_err();
        assert!(matches!(err, RecipeError::ImageGeneration(_)));
    }
}
