#![forbid(unsafe_code)]
#![doc = r#"
Chat2Upstream

Validate OpenAI-style Chat Completions requests and reshape them into the flat payload a
chat-completion upstream expects, then proxy them to that upstream.

Crate highlights
- Library: pure validation via `validate_chat_body(&Value)` and pure mapping via
  `to_upstream_payload(&ValidatedChatRequest, String)`; `prepare_upstream_request` chains both.
- HTTP server (in `server`): `/v1/chat/completions`, `/convert`, `/v1/models`, `/health`.
- Models: strongly-typed validated request and upstream payload.

Modules
- `models`: Data structures for the inbound request and the upstream payload.
- `validation`: Schema checks and model resolution.
- `conversion`: Mapping from validated request to upstream payload.
- `config`: Environment-driven settings.
- `server`: Axum router/handlers (the binary uses this).
- `util`: Shared helpers (tracing, HTTP client, upstream forwarding, CORS).
"#]

pub mod config;
pub mod conversion;
pub mod models;
pub mod server;
pub mod util;
pub mod validation;

pub use crate::conversion::{flatten_content, prepare_upstream_request, to_upstream_payload};
pub use crate::validation::{
    resolve_model, validate_chat_body, MessageFault, ValidationError, DEFAULT_MODEL,
};

// Re-export model namespaces for convenience (downstream users can do `use chat2upstream::chat`).
pub use crate::models::{chat, upstream};
