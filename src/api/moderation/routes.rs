// HTTP adapter for the moderation service.
//
// Translates JSON requests into core calls and core results into responses.
// No business logic lives here - the engine is in core/moderation.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::moderation::{
    FilterStore, FilterUpdate, ModerationError, ModerationOutcome, ModerationService, StoryPayload,
};

/// State shared across all handlers.
pub struct ApiState<S: FilterStore> {
    moderation: Arc<ModerationService<S>>,
    /// Value `PUT /filters` must present in the `x-admin-token` header.
    /// `None` disables the route entirely.
    admin_token: Option<String>,
}

impl<S: FilterStore> ApiState<S> {
    pub fn new(moderation: Arc<ModerationService<S>>, admin_token: Option<String>) -> Self {
        Self {
            moderation,
            admin_token,
        }
    }
}

// Manual impl: derive(Clone) would require S: Clone, which stores don't need.
impl<S: FilterStore> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            moderation: Arc::clone(&self.moderation),
            admin_token: self.admin_token.clone(),
        }
    }
}

/// Build the moderation router.
pub fn router<S: FilterStore + 'static>(state: ApiState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/moderate/text", post(moderate_text::<S>))
        .route("/moderate/story", post(moderate_story::<S>))
        .route("/moderate/prompt", post(moderate_prompt::<S>))
        .route("/filters", get(get_filters::<S>).put(put_filters::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ModerateTextRequest {
    content: String,
    #[serde(default = "default_content_type")]
    content_type: String,
}

fn default_content_type() -> String {
    "story".to_string()
}

#[derive(Debug, Deserialize)]
struct ModeratePromptRequest {
    prompt: String,
    #[serde(default)]
    context: Option<String>,
}

async fn health() -> &'static str {
    "ok"
}

async fn moderate_text<S: FilterStore>(
    State(state): State<ApiState<S>>,
    Json(request): Json<ModerateTextRequest>,
) -> Json<ModerationOutcome> {
    Json(
        state
            .moderation
            .moderate_text(&request.content, &request.content_type)
            .await,
    )
}

async fn moderate_story<S: FilterStore>(
    State(state): State<ApiState<S>>,
    Json(story): Json<StoryPayload>,
) -> Json<ModerationOutcome> {
    Json(state.moderation.moderate_story(&story).await)
}

async fn moderate_prompt<S: FilterStore>(
    State(state): State<ApiState<S>>,
    Json(request): Json<ModeratePromptRequest>,
) -> Json<ModerationOutcome> {
    Json(
        state
            .moderation
            .moderate_prompt(&request.prompt, request.context.as_deref())
            .await,
    )
}

async fn get_filters<S: FilterStore>(State(state): State<ApiState<S>>) -> Response {
    match state.moderation.get_filters().await {
        Ok(config) => Json(config).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn put_filters<S: FilterStore>(
    State(state): State<ApiState<S>>,
    headers: HeaderMap,
    Json(update): Json<FilterUpdate>,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "admin updates are disabled" })),
        )
            .into_response();
    };
    let presented = headers.get("x-admin-token").and_then(|v| v.to_str().ok());
    if presented != Some(expected) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid admin token" })),
        )
            .into_response();
    }

    match state.moderation.update_filters(update).await {
        Ok(config) => Json(config).into_response(),
        Err(err) => storage_error(err),
    }
}

fn storage_error(err: ModerationError) -> Response {
    tracing::error!("filter storage error: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "storage unavailable" })),
    )
        .into_response()
}
