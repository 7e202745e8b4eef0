use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chef_quirky::{
    server, ImageGenerator, LlmProvider, RecipeError, RecipeParser, RecipeService,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct ScriptedProvider(&'static str);

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, RecipeError> {
        Ok(self.0.to_string())
    }
}

struct UnavailableProvider;

#[async_trait]
impl LlmProvider for UnavailableProvider {
    fn provider_name(&self) -> &str {
        "unavailable"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, RecipeError> {
        Err(RecipeError::Generation("model is overloaded".to_string()))
    }
}

struct StaticImages;

#[async_trait]
impl ImageGenerator for StaticImages {
    fn provider_name(&self) -> &str {
        "static"
    }

    async fn generate_image(&self, _prompt: &str) -> Result<String, RecipeError> {
        Ok("https://images.test/card.png".to_string())
    }
}

const PANCAKES: &str = "Flip out with me!\n\n**Pancakes**\nIngredients:\n- Flour\n- Milk\nInstructions:\n1. Mix\n2. Cook";

fn app(provider: impl LlmProvider + 'static, with_images: bool) -> Router {
    let images: Option<Box<dyn ImageGenerator>> = if with_images {
        Some(Box::new(StaticImages))
    } else {
        None
    };
    let service = RecipeService::new(Box::new(provider), images, RecipeParser::default());
    server::router(Arc::new(service))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_create_recipe() {
    let (status, body) = send(
        app(ScriptedProvider(PANCAKES), true),
        post_json("/api/recipes", json!({"recipeName": "pancakes"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["introText"], "Flip out with me!");
    assert_eq!(body["recipe"]["name"], "Pancakes");
    assert_eq!(body["recipe"]["day"], "");
    assert_eq!(body["recipe"]["ingredients"], json!(["Flour", "Milk"]));
    assert_eq!(body["recipe"]["instructions"], json!(["Mix", "Cook"]));
    assert_eq!(body["recipe"]["imageUrl"], "https://images.test/card.png");
}

#[tokio::test]
async fn test_create_recipe_from_user_input() {
    let (status, body) = send(
        app(ScriptedProvider(PANCAKES), false),
        post_json("/api/recipes", json!({"recipeName": "  ", "userInput": "something sweet"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["recipe"].get("imageUrl").is_none());
}

#[tokio::test]
async fn test_create_recipe_without_request() {
    let (status, body) = send(
        app(ScriptedProvider(PANCAKES), false),
        post_json("/api/recipes", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please tell Chef Quirky what you'd like to cook!");
}

#[tokio::test]
async fn test_unrecognized_reply_is_server_error() {
    let (status, body) = send(
        app(ScriptedProvider("Let me tell you about my cat instead."), false),
        post_json("/api/recipes", json!({"recipeName": "soup"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Chef Quirky could not understand the recipe format");
}

#[tokio::test]
async fn test_provider_failure_is_server_error() {
    let (status, body) = send(
        app(UnavailableProvider, false),
        post_json("/api/recipes", json!({"recipeName": "soup"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("overloaded"));
}

#[tokio::test]
async fn test_weekly_endpoints_return_seven_recipes() {
    let reply = "Cheers!\n\n**Monday: Mojito**\nIngredients:\n- Mint\n- Rum\nInstructions:\n1. Muddle\n2. Pour";
    for uri in [
        "/api/weekly_recipes",
        "/api/cocktails",
        "/api/fast_food",
        "/api/savoury_meals",
        "/api/cakes",
    ] {
        let (status, body) = send(app(ScriptedProvider(reply), false), get(uri)).await;

        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["introText"], "Cheers!");
        let recipes = body["recipes"].as_array().unwrap();
        assert_eq!(recipes.len(), 7);
        assert_eq!(recipes[0]["name"], "Mojito");
        assert_eq!(recipes[0]["day"], "Monday");
        assert_eq!(recipes[6]["day"], "Sunday");
    }
}

#[tokio::test]
async fn test_cocktail_placeholders() {
    let reply = "**Monday: Mojito**\nIngredients:\n- Mint\nInstructions:\n1. Muddle";
    let (_, body) = send(app(ScriptedProvider(reply), false), get("/api/cocktails")).await;
    assert_eq!(body["recipes"][1]["name"], "Placeholder Cocktail 2");
    assert_eq!(body["recipes"][1]["day"], "Tuesday");
}

#[tokio::test]
async fn test_generate_image() {
    let (status, body) = send(
        app(ScriptedProvider(PANCAKES), true),
        post_json("/api/generate-image", json!({"prompt": "a quirky chef"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageUrl"], "https://images.test/card.png");
}

#[tokio::test]
async fn test_generate_image_without_prompt() {
    let (status, body) = send(
        app(ScriptedProvider(PANCAKES), true),
        post_json("/api/generate-image", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a prompt");
}

#[tokio::test]
async fn test_health() {
    let response = app(ScriptedProvider(PANCAKES), false)
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/recipes")
        .header("content-type", "application/json")
        .body(Body::from("{\"recipeName\": "))
        .unwrap();
    let (status, body) = send(app(ScriptedProvider(PANCAKES), false), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_non_json_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-image")
        .header("content-type", "text/plain")
        .body(Body::from("a quirky chef"))
        .unwrap();
    let (status, body) = send(app(ScriptedProvider(PANCAKES), true), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
