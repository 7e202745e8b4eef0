use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ImageConfig;
use crate::error::RecipeError;
use crate::images::ImageGenerator;

const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// Stable Diffusion on Replicate: create a prediction, then poll it until it
/// settles or the poll budget runs out.
pub struct ReplicateImageGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    config: ImageConfig,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
}

impl Prediction {
    /// First output URL; the API returns either a list or a single string
    fn output_url(&self) -> Option<&str> {
        match &self.output {
            Value::Array(items) => items.first().and_then(Value::as_str),
            Value::String(url) => Some(url.as_str()),
            _ => None,
        }
    }
}

impl ReplicateImageGenerator {
    /// Create a new Replicate generator from configuration
    pub fn new(config: &ImageConfig, timeout: Duration) -> Result<Self, RecipeError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("REPLICATE_API_KEY").ok())
            .or_else(|| std::env::var("REPLICATE_API_TOKEN").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                RecipeError::Provider(
                    "REPLICATE_API_KEY not found in config or environment".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(ReplicateImageGenerator {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url,
            config: config.clone(),
        })
    }

    async fn create_prediction(&self, prompt: &str) -> Result<Prediction, RecipeError> {
        let response = self
            .client
            .post(format!("{}/v1/predictions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "version": self.config.version,
                "input": {
                    "prompt": prompt,
                    "num_outputs": 1,
                    "width": self.config.width,
                    "height": self.config.height,
                    "scheduler": self.config.scheduler,
                    "num_inference_steps": self.config.num_inference_steps,
                    "guidance_scale": self.config.guidance_scale,
                    "negative_prompt": self.config.negative_prompt
                }
            }))
            .send()
            .await?;

        read_prediction(response).await
    }

    async fn get_prediction(&self, id: &str) -> Result<Prediction, RecipeError> {
        let response = self
            .client
            .get(format!("{}/v1/predictions/{}", self.base_url, id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        read_prediction(response).await
    }
}

async fn read_prediction(response: Response) -> Result<Prediction, RecipeError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RecipeError::ImageGeneration(format!(
            "replicate returned {}: {}",
            status, body
        )));
    }
    Ok(response.json().await?)
}

#[async_trait]
impl ImageGenerator for ReplicateImageGenerator {
    fn provider_name(&self) -> &str {
        "replicate"
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, RecipeError> {
        let mut prediction = self.create_prediction(prompt).await?;
        info!("Created prediction {} for '{}'", prediction.id, prompt);

        let mut polls = 0;
        loop {
            debug!("Prediction {} status: {}", prediction.id, prediction.status);
            match prediction.status.as_str() {
                "succeeded" => {
                    return prediction.output_url().map(str::to_string).ok_or_else(|| {
                        RecipeError::ImageGeneration(format!(
                            "No image URL in output of prediction {}",
                            prediction.id
                        ))
                    });
                }
                "failed" | "canceled" => {
                    return Err(RecipeError::ImageGeneration(format!(
                        "prediction {} {}: {}",
                        prediction.id, prediction.status, prediction.error
                    )));
                }
                _ => {}
            }

            if polls >= self.config.max_poll_attempts {
                warn!(
                    "Prediction {} still '{}' after {} polls, giving up",
                    prediction.id, prediction.status, polls
                );
                return Err(RecipeError::ImageTimeout(polls));
            }
            if polls > 0 {
                sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
            }
            polls += 1;
            prediction = self.get_prediction(&prediction.id).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn test_config(base_url: String, max_poll_attempts: u32) -> ImageConfig {
        ImageConfig {
            api_key: Some("r8_test".to_string()),
            base_url: Some(base_url),
            poll_interval_ms: 1,
            max_poll_attempts,
            ..Default::default()
        }
    }

    fn generator(server: &Server, max_poll_attempts: u32) -> ReplicateImageGenerator {
        ReplicateImageGenerator::new(
            &test_config(server.url(), max_poll_attempts),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_polls_until_succeeded() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/predictions")
            .match_header("authorization", "Bearer r8_test")
            .match_body(Matcher::PartialJson(json!({
                "input": {"prompt": "A beautiful photo of Soup", "width": 768}
            })))
            .with_status(201)
            .with_body(r#"{"id": "p1", "status": "starting"}"#)
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/v1/predictions/p1")
            .with_status(200)
            .with_body(
                r#"{"id": "p1", "status": "succeeded", "output": ["https://replicate.delivery/p1.png"]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let url = generator(&server, 5)
            .generate_image("A beautiful photo of Soup")
            .await
            .unwrap();

        assert_eq!(url, "https://replicate.delivery/p1.png");
        create.assert_async().await;
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_terminal_status_on_create_skips_polling() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/v1/predictions")
            .with_status(201)
            .with_body(r#"{"id": "p2", "status": "succeeded", "output": "https://img/p2.png"}"#)
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/v1/predictions/p2")
            .expect(0)
            .create_async()
            .await;

        let url = generator(&server, 5).generate_image("cake").await.unwrap();
        assert_eq!(url, "https://img/p2.png");
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_prediction() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/v1/predictions")
            .with_status(201)
            .with_body(r#"{"id": "p3", "status": "processing"}"#)
            .create_async()
            .await;
        let _poll = server
            .mock("GET", "/v1/predictions/p3")
            .with_status(200)
            .with_body(r#"{"id": "p3", "status": "failed", "error": "NSFW content detected"}"#)
            .create_async()
            .await;

        let err = generator(&server, 5).generate_image("cake").await.unwrap_err();
        assert!(matches!(err, RecipeError::ImageGeneration(_)));
        assert!(err.to_string().contains("NSFW"));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_polls() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/v1/predictions")
            .with_status(201)
            .with_body(r#"{"id": "p4", "status": "starting"}"#)
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/v1/predictions/p4")
            .with_status(200)
            .with_body(r#"{"id": "p4", "status": "processing"}"#)
            .expect(3)
            .create_async()
            .await;

        let err = generator(&server, 3).generate_image("cake").await.unwrap_err();
        assert!(matches!(err, RecipeError::ImageTimeout(3)));
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_rejected() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/v1/predictions")
            .with_status(401)
            .with_body(r#"{"detail": "Unauthenticated"}"#)
            .create_async()
            .await;

        let err = generator(&server, 3).generate_image("cake").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_succeeded_without_output() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/v1/predictions")
            .with_status(201)
            .with_body(r#"{"id": "p5", "status": "succeeded", "output": []}"#)
            .create_async()
            .await;

        let err = generator(&server, 3).generate_image("cake").await.unwrap_err();
        assert!(err.to_string().contains("No image URL"));
    }
}
