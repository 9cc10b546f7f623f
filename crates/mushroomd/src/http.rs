//! HTTP boundary: `/api/chat/generate` and `/api/chat/healthcheck`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mushroom_core::InferenceGateway;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, warn};

pub const INVALID_PROMPT: &str = "Invalid request, 'prompt' missing";

#[derive(Clone)]
struct AppState {
    gateway: Arc<InferenceGateway>,
}

/// Body of `POST /api/chat/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Build the router around a ready gateway.
pub fn router(gateway: Arc<InferenceGateway>) -> Router {
    Router::new()
        .route("/api/chat/generate", post(generate))
        .route("/api/chat/healthcheck", get(healthcheck))
        .with_state(AppState { gateway })
}

/// Serve `router(gateway)` on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    gateway: Arc<InferenceGateway>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let prompt = match payload {
        Ok(Json(GenerateRequest {
            prompt: Some(prompt),
        })) if !prompt.trim().is_empty() => prompt,
        Ok(_) => return bad_request(),
        Err(rejection) => {
            warn!(error = %rejection, "Rejected generate body");
            return bad_request();
        }
    };

    match state.gateway.infer(&prompt).await {
        Ok(response) => (StatusCode::OK, Json(json!({ "response": response }))).into_response(),
        Err(e) => {
            error!(error = %e, "Inference failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": INVALID_PROMPT })),
    )
        .into_response()
}
