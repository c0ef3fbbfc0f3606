use serde::Serialize;
use serde_json::{Map, Number, Value};
use serde_with::skip_serializing_none;

/// Chat Completions role enumeration accepted by this layer.
///
/// Uses lowercase serialization to match the OpenAI Chat API:
/// "system" | "user" | "assistant"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Parse a wire role name. Anything outside the three known roles is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Image reference carried by an `image_url` content item.
///
/// Only the presence of `url` is checked; its value is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: Value,
    /// Remaining fields such as "detail".
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of an array-shaped message content.
///
/// Example:
/// [
///   { "type": "text", "text": "What is in this image?" },
///   { "type": "image_url", "image_url": { "url": "https://..." } }
/// ]
///
/// Unknown `type` values are kept verbatim in `Other` so newer content kinds survive
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    ImageUrl {
        image_url: ImageUrl,
    },
    #[serde(untagged)]
    Other(Value),
}

impl ContentItem {
    /// Text carried by a `text` item, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Message content: a plain string or an ordered list of content items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentItem>),
}

/// A validated conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Chat Completions request after validation.
///
/// Optional fields are `Some` only when the caller sent them; absent fields are skipped
/// on serialization. Numbers are kept as `serde_json::Number` so they are forwarded with
/// the caller's own spelling (`256` stays an integer).
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedChatRequest {
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,

    // Streaming
    pub stream: Option<bool>,

    // Sampling / decoding
    pub temperature: Option<Number>,
    pub top_p: Option<Number>,
    pub max_tokens: Option<Number>,
    pub presence_penalty: Option<Number>,
    pub frequency_penalty: Option<Number>,
    pub seed: Option<Number>,
}

impl ValidatedChatRequest {
    /// A request with the given messages and every optional field absent.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: None,
            messages,
            stream: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            presence_penalty: None,
            frequency_penalty: None,
            seed: None,
        }
    }
}
