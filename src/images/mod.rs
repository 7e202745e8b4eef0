mod replicate;

pub use replicate::ReplicateImageGenerator;

use async_trait::async_trait;

use crate::error::RecipeError;

/// Turns a text prompt into a hosted image URL
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn generate_image(&self, prompt: &str) -> Result<String, RecipeError>;
}

/// Prompt used to illustrate a recipe card
pub fn recipe_image_prompt(recipe_name: &str) -> String {
    format!("A beautiful photo of {}", recipe_name)
}
