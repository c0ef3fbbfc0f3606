use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use http::StatusCode;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::conversion::prepare_upstream_request;
use crate::models::upstream::{ModelsResponse, UpstreamPayload};
use crate::util::{
    cors_layer_from_env, error_response, post_json_upstream, sse_proxy_stream, AppState,
};

/// Build the Axum router for the given state.
///
/// Routes:
/// - `GET /health`
/// - `GET /v1/models` (alias `/models`)
/// - `POST /v1/chat/completions` (alias `/chat/completions`)
/// - `POST /convert` returns the upstream payload without forwarding it
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/v1/models", get(list_models))
        .route("/chat/completions", post(chat_completions))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/convert", post(convert))
        .with_state(state)
        .layer(cors_layer_from_env())
        .layer(TraceLayer::new_for_http())
}

/// Service status endpoint.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "name": "chat2upstream",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ModelsResponse::from_ids(
        state.config.models.iter().cloned(),
        state.started_at,
    ))
}

/// Validate and reshape a Chat Completions body, returning the upstream payload.
async fn convert(body: Bytes) -> Response {
    match normalize(&body) {
        Ok(payload) => Json(payload).into_response(),
        Err(resp) => resp,
    }
}

/// Validate, reshape and forward a Chat Completions request to the upstream.
/// - Non-streaming: JSON roundtrip
/// - Streaming: SSE passthrough
async fn chat_completions(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload = match normalize(&body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let url = state.config.chat_completions_url();
    tracing::debug!(
        model = %payload.model,
        stream = payload.stream,
        messages = payload.messages.len(),
        "forwarding chat completion upstream"
    );

    let result = if payload.stream {
        sse_proxy_stream(&state.http, &url, &payload, state.api_key()).await
    } else {
        post_json_upstream(&state.http, &url, &payload, state.api_key()).await
    };

    match result {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(error = %e, "upstream request failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream_unreachable",
                &e.to_string(),
            )
        }
    }
}

/// Parse the raw body and run the validation-and-mapping pipeline.
/// Any failure is already shaped as a 400 response.
fn normalize(body: &[u8]) -> Result<UpstreamPayload, Response> {
    let raw: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "rejecting request with unparseable JSON body");
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            "invalid_json",
            &format!("Request body is not valid JSON: {e}"),
        )
    })?;

    prepare_upstream_request(&raw).map_err(|e| {
        tracing::warn!(code = e.kind(), "rejecting invalid chat request");
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            e.kind(),
            &e.to_string(),
        )
    })
}
