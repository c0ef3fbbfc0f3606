//! Data models for the inbound Chat Completions request and the upstream payload.
//!
//! This module groups two submodules:
//! - `chat`: Strongly-typed, already-validated Chat Completions request models.
//! - `upstream`: The flat request body sent to the chat-completion upstream, plus the
//!   `/v1/models` listing shape.
//!
//! Construction of `chat::ValidatedChatRequest` from raw JSON lives in `crate::validation`;
//! the mapping to `upstream::UpstreamPayload` lives in `crate::conversion`.

pub mod chat;
pub mod upstream;

pub use chat::{ChatMessage, ContentItem, ImageUrl, MessageContent, Role, ValidatedChatRequest};
pub use upstream::{ModelObject, ModelsResponse, UpstreamMessage, UpstreamPayload};
