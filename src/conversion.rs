use crate::models::chat::{ChatMessage, MessageContent, ValidatedChatRequest};
use crate::models::upstream::{UpstreamMessage, UpstreamPayload};
use crate::validation::{resolve_model, validate_chat_body, ValidationError};

/// Convert a validated Chat Completions request into the upstream request body.
///
/// Mapping highlights:
/// - messages: forwarded 1:1 in order; structured content is flattened to a string
///   (see `flatten_content`).
/// - stream: always present, `false` unless the caller asked for streaming.
/// - temperature/top_p/max_tokens/penalties/seed: carried through unchanged,
///   absent stays absent.
pub fn to_upstream_payload(src: &ValidatedChatRequest, model: String) -> UpstreamPayload {
    UpstreamPayload {
        model,
        messages: map_messages(&src.messages),
        stream: src.stream.unwrap_or(false),
        // Sampling / decoding
        temperature: src.temperature.clone(),
        top_p: src.top_p.clone(),
        max_tokens: src.max_tokens.clone(),
        presence_penalty: src.presence_penalty.clone(),
        frequency_penalty: src.frequency_penalty.clone(),
        seed: src.seed.clone(),
    }
}

/// Validate a raw body, resolve its model and map it in one step.
///
/// This is the entry point used by the HTTP layer.
pub fn prepare_upstream_request(
    body: &serde_json::Value,
) -> Result<UpstreamPayload, ValidationError> {
    let validated = validate_chat_body(body)?;
    let model = resolve_model(validated.model.as_deref());
    Ok(to_upstream_payload(&validated, model))
}

/// Flatten message content into the plain string the upstream expects.
///
/// Strings are used verbatim. For content arrays only `text` items are kept, joined
/// with '\n' in their original order; image and unknown items are dropped. An array
/// without any text item therefore flattens to "".
pub fn flatten_content(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(s) => s.clone(),
        MessageContent::Parts(items) => items
            .iter()
            .filter_map(|item| item.as_text())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn map_messages(messages: &[ChatMessage]) -> Vec<UpstreamMessage> {
    messages
        .iter()
        .map(|m| UpstreamMessage {
            role: m.role.as_str().to_string(),
            content: flatten_content(&m.content),
        })
        .collect()
}
