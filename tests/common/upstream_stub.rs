#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Body streamed back when the forwarded payload has `stream: true`.
pub const SSE_BODY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
data: [DONE]\n\n";

/// What the stub answers with.
#[derive(Clone)]
pub enum StubReply {
    /// 200 with a chat.completion JSON body (or SSE when streaming was requested).
    Ok,
    /// A fixed error status and JSON body.
    Error {
        status: StatusCode,
        body: serde_json::Value,
    },
}

/// A recorded upstream call.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub body: serde_json::Value,
    pub authorization: Option<String>,
    pub accept: Option<String>,
}

#[derive(Clone)]
struct StubState {
    reply: StubReply,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// Minimal chat-completion upstream bound to an ephemeral local port.
pub struct UpstreamStub {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl UpstreamStub {
    pub async fn start(reply: StubReply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            reply,
            requests: requests.clone(),
        };

        let router = Router::new()
            .route("/v1/chat/completions", post(chat_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream stub");
        let addr = listener.local_addr().expect("upstream stub local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Upstream stub server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        UpstreamStub {
            base_url: format!("http://{}/v1", addr),
            requests,
            shutdown: Some(tx),
        }
    }

    /// Base URL to put into `Config`, e.g. "http://127.0.0.1:12345/v1".
    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn take_requests(&self) -> Vec<Recorded> {
        let mut guard = self.requests.lock().expect("lock stub requests");
        guard.drain(..).collect()
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn chat_handler(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };
    let streaming = body.get("stream").and_then(|s| s.as_bool()) == Some(true);
    if let Ok(mut guard) = state.requests.lock() {
        guard.push(Recorded {
            body: body.clone(),
            authorization: header_str(header::AUTHORIZATION),
            accept: header_str(header::ACCEPT),
        });
    }

    match &state.reply {
        StubReply::Error { status, body } => (*status, Json(body.clone())).into_response(),
        StubReply::Ok if streaming => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/event-stream")],
            SSE_BODY,
        )
            .into_response(),
        StubReply::Ok => Json(serde_json::json!({
            "id": "chatcmpl-stub",
            "object": "chat.completion",
            "created": 0,
            "model": body.get("model").cloned().unwrap_or_default(),
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
        }))
        .into_response(),
    }
}
