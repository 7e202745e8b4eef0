use serde::{Deserialize, Serialize};

/// One recipe card extracted from a model reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    /// Day of the week in weekly sets, empty for single recipes
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, day: impl Into<String>) -> Self {
        Recipe {
            name: name.into(),
            day: day.into(),
            ..Default::default()
        }
    }

    /// A recipe is complete once it has both ingredients and instructions
    pub fn is_complete(&self) -> bool {
        !self.ingredients.is_empty() && !self.instructions.is_empty()
    }
}

/// Output of one parse call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    /// Quirky preamble, trimmed and capped
    pub intro_text: String,
    pub recipes: Vec<Recipe>,
    /// Set when the parser gave up on the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Body of `POST /api/recipes`. Either field may carry the dish request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[serde(default)]
    pub recipe_name: Option<String>,
    #[serde(default)]
    pub user_input: Option<String>,
}

impl RecipeRequest {
    /// The dish request, preferring `recipeName` over `userInput`
    pub fn request_text(&self) -> Option<&str> {
        [self.recipe_name.as_deref(), self.user_input.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleRecipeResponse {
    pub intro_text: String,
    pub recipe: Recipe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSetResponse {
    pub intro_text: String,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

/// Shared error body for every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recipe_serializes_camel_case_without_missing_image() {
        let mut recipe = Recipe::new("Soup", "Monday");
        recipe.ingredients.push("Water".to_string());

        let value = serde_json::to_value(&recipe).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Soup",
                "day": "Monday",
                "ingredients": ["Water"],
                "instructions": []
            })
        );

        recipe.image_url = Some("https://img.example/soup.png".to_string());
        let value = serde_json::to_value(&recipe).unwrap();
        assert_eq!(value["imageUrl"], "https://img.example/soup.png");
    }

    #[test]
    fn test_recipe_completeness() {
        let mut recipe = Recipe::new("Toast", "");
        assert!(!recipe.is_complete());
        recipe.ingredients.push("Bread".to_string());
        assert!(!recipe.is_complete());
        recipe.instructions.push("Toast it".to_string());
        assert!(recipe.is_complete());
    }

    #[test]
    fn test_request_text_prefers_recipe_name() {
        let request: RecipeRequest =
            serde_json::from_str(r#"{"recipeName": "Lasagna", "userInput": "Tacos"}"#).unwrap();
        assert_eq!(request.request_text(), Some("Lasagna"));

        let request: RecipeRequest =
            serde_json::from_str(r#"{"recipeName": "  ", "userInput": " Tacos "}"#).unwrap();
        assert_eq!(request.request_text(), Some("Tacos"));

        let request: RecipeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.request_text(), None);
    }

    #[test]
    fn test_parse_result_omits_empty_diagnostic() {
        let value = serde_json::to_value(ParseResult::default()).unwrap();
        assert_eq!(value, json!({"introText": "", "recipes": []}));
    }
}
