use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use std::sync::Arc;

use crate::error::RecipeError;
use crate::model::{
    ErrorResponse, ImageRequest, ImageResponse, RecipeRequest, RecipeSetResponse,
    SingleRecipeResponse,
};
use crate::providers::WeeklyCategory;
use crate::service::RecipeService;

type SharedService = Arc<RecipeService>;

impl From<JsonRejection> for RecipeError {
    fn from(rejection: JsonRejection) -> Self {
        RecipeError::MissingInput(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for RecipeError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// All HTTP routes, with the weekly sets mounted under `/api/<slug>`
pub fn router(service: SharedService) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/recipes", post(create_recipe))
        .route("/api/generate-image", post(create_image));

    for category in WeeklyCategory::ALL {
        router = router.route(
            &format!("/api/{}", category.slug()),
            get(move |state: State<SharedService>| weekly_set(state, category)),
        );
    }

    router.with_state(service)
}

/// Bind `bind` and serve until the process is stopped
pub async fn serve(service: SharedService, bind: &str) -> Result<(), RecipeError> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Chef Quirky listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn create_recipe(
    State(service): State<SharedService>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<Json<SingleRecipeResponse>, RecipeError> {
    let Json(request) = payload?;
    let text = request.request_text().unwrap_or_default();
    Ok(Json(service.generate_recipe(text).await?))
}

async fn weekly_set(
    State(service): State<SharedService>,
    category: WeeklyCategory,
) -> Result<Json<RecipeSetResponse>, RecipeError> {
    Ok(Json(service.generate_weekly(category).await?))
}

async fn create_image(
    State(service): State<SharedService>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, RecipeError> {
    let Json(request) = payload?;
    let prompt = request.prompt.unwrap_or_default();
    let image_url = service.generate_image(&prompt).await?;
    Ok(Json(ImageResponse { image_url }))
}
