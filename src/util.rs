use axum::response::{IntoResponse, Response};
use http::StatusCode;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::models::upstream::UpstreamPayload;

/// Initialize dotenv and structured tracing based on RUST_LOG.
/// - Supports explicit env file paths via ENV_FILE or DOTENV_PATH
/// - Falls back to default .env discovery
/// - Logs the source used
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }

    if env_source == "none" && dotenvy::dotenv().is_ok() {
        env_source = ".env".into();
    }

    // Initialize tracing (respects RUST_LOG potentially provided by the env file)
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Shared application state used by the HTTP server and handlers.
pub struct AppState {
    pub http: reqwest::Client,
    pub config: Config,
    /// Unix seconds at startup, reported as `created` by `/v1/models`.
    pub started_at: u64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            http: build_http_client(&config),
            config,
            started_at: unix_now(),
        }
    }

    /// Bearer token for the upstream, if configured.
    pub fn api_key(&self) -> Option<&str> {
        self.config.upstream_api_key.as_deref()
    }
}

/// Build the outbound HTTP client honoring the configured timeout and proxy switch.
pub fn build_http_client(config: &Config) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    if config.no_proxy {
        builder = builder.no_proxy();
    }

    if let Some(timeout) = config.upstream_timeout {
        builder = builder.timeout(timeout);
    }

    // User-Agent for observability
    builder = builder.user_agent(format!("chat2upstream/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default HTTP client");
        reqwest::Client::new()
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Build an OpenAI-style JSON error response.
///
/// Body: { "error": { "message": ..., "type": ..., "code": ... } }
pub fn error_response(status: StatusCode, kind: &str, code: &str, msg: &str) -> Response {
    let body = serde_json::json!({
        "error": { "message": msg, "type": kind, "code": code }
    });
    (status, axum::Json(body)).into_response()
}

/// Non-streaming POST: send the payload and hand back upstream status and bytes verbatim.
pub async fn post_json_upstream(
    client: &reqwest::Client,
    url: &str,
    payload: &UpstreamPayload,
    bearer: Option<&str>,
) -> Result<Response, anyhow::Error> {
    use http::header;

    let mut rb = client
        .post(url)
        .header(header::CONTENT_TYPE, "application/json")
        .json(payload);
    if let Some(k) = bearer.filter(|k| !k.is_empty()) {
        rb = rb.bearer_auth(k);
    }
    let resp = rb.send().await?;

    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| http::HeaderValue::from_static("application/json"));
    let bytes = resp.bytes().await?;
    Ok((status, [(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Streaming POST: request SSE from the upstream and pass the body through unbuffered.
///
/// Upstream errors (non-2xx) are returned with their original status, content type and body.
pub async fn sse_proxy_stream(
    client: &reqwest::Client,
    url: &str,
    payload: &UpstreamPayload,
    bearer: Option<&str>,
) -> Result<Response, anyhow::Error> {
    use axum::body::Body;
    use futures_util::TryStreamExt;
    use http::header;

    let mut rb = client
        .post(url)
        .header(header::ACCEPT, "text/event-stream")
        .header(header::CONTENT_TYPE, "application/json")
        .json(payload);
    if let Some(k) = bearer.filter(|k| !k.is_empty()) {
        rb = rb.bearer_auth(k);
    }
    let resp = rb.send().await?;

    let status = resp.status();
    if !status.is_success() {
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| http::HeaderValue::from_static("application/json"));
        let bytes = resp.bytes().await?;
        return Ok((status, [(header::CONTENT_TYPE, content_type)], bytes).into_response());
    }

    let upstream_ct = resp.headers().get(header::CONTENT_TYPE).cloned();
    let stream = resp
        .bytes_stream()
        .map_err(|e| std::io::Error::other(e.to_string()));

    let mut builder = http::Response::builder().status(status);
    if let Some(ct) = upstream_ct {
        builder = builder.header(header::CONTENT_TYPE, ct);
    } else {
        builder = builder.header(header::CONTENT_TYPE, "text/event-stream");
    }
    let response = builder
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))?;

    Ok(response)
}

/// Build a CORS layer from environment variables.
///
/// Environment variables:
/// - CORS_ALLOWED_ORIGINS: "*" or comma-separated origins (e.g., "https://a.com, https://b.com")
/// - CORS_ALLOWED_METHODS: "*" or comma-separated methods
/// - CORS_ALLOWED_HEADERS: "*" or comma-separated request header names
/// - CORS_MAX_AGE: max age in seconds (u64)
///
/// Defaults: any origin, GET/POST/OPTIONS, Content-Type and Authorization headers.
pub fn cors_layer_from_env() -> tower_http::cors::CorsLayer {
    use std::time::Duration;
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

    let mut layer = CorsLayer::new();

    let origins = env_list("CORS_ALLOWED_ORIGINS");
    layer = match origins.as_deref() {
        None => layer.allow_origin(Any),
        Some([only]) if only == "*" => layer.allow_origin(Any),
        Some(list) => {
            let vals: Vec<_> = list
                .iter()
                .filter_map(|p| http::HeaderValue::from_str(p).ok())
                .collect();
            if vals.is_empty() {
                layer.allow_origin(Any)
            } else {
                layer.allow_origin(AllowOrigin::list(vals))
            }
        }
    };

    let methods = env_list("CORS_ALLOWED_METHODS");
    layer = match methods.as_deref() {
        Some([only]) if only == "*" => layer.allow_methods(Any),
        Some(list) => {
            let vals: Vec<_> = list
                .iter()
                .filter_map(|p| http::Method::from_bytes(p.to_ascii_uppercase().as_bytes()).ok())
                .collect();
            if vals.is_empty() {
                layer.allow_methods(Any)
            } else {
                layer.allow_methods(AllowMethods::list(vals))
            }
        }
        None => layer.allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ]),
    };

    let headers = env_list("CORS_ALLOWED_HEADERS");
    layer = match headers.as_deref() {
        Some([only]) if only == "*" => layer.allow_headers(Any),
        Some(list) => {
            let vals: Vec<_> = list
                .iter()
                .filter_map(|p| http::header::HeaderName::try_from(p.as_str()).ok())
                .collect();
            if vals.is_empty() {
                layer.allow_headers(Any)
            } else {
                layer.allow_headers(AllowHeaders::list(vals))
            }
        }
        None => layer.allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]),
    };

    if let Ok(secs) = std::env::var("CORS_MAX_AGE") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            layer = layer.max_age(Duration::from_secs(n));
        }
    }

    layer
}

/// Comma-separated env var as trimmed, non-empty entries. `None` when unset or blank.
fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
