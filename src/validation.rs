//! Request validation for inbound Chat Completions bodies.
//!
//! `validate_chat_body` narrows an arbitrary JSON value into a `ValidatedChatRequest`
//! or fails with the first `ValidationError` found. Messages are checked in order and
//! validation stops at the first bad one.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::models::chat::{
    ChatMessage, ContentItem, ImageUrl, MessageContent, Role, ValidatedChatRequest,
};

/// Model used when the caller does not name one.
pub const DEFAULT_MODEL: &str = "qwen3-coder-plus";

/// Inclusive numeric bounds for the optional sampling fields.
pub mod limits {
    /// Temperature range: 0.0 to 2.0
    pub const TEMPERATURE: (f64, f64) = (0.0, 2.0);
    /// Top-p range: 0.0 to 1.0
    pub const TOP_P: (f64, f64) = (0.0, 1.0);
    /// Lower bound for max_tokens; there is no upper bound.
    pub const MAX_TOKENS_MIN: f64 = 1.0;
    /// Presence penalty range: -2.0 to 2.0
    pub const PRESENCE_PENALTY: (f64, f64) = (-2.0, 2.0);
    /// Frequency penalty range: -2.0 to 2.0
    pub const FREQUENCY_PENALTY: (f64, f64) = (-2.0, 2.0);
}

/// Which message constraint was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFault {
    /// The element is not a JSON object.
    NotAnObject,
    /// `role` is missing, not a string, or not one of system|user|assistant.
    InvalidRole,
    /// `content` is missing, blank, an empty array, or holds an invalid item.
    InvalidContent,
}

impl MessageFault {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFault::NotAnObject => "message must be a JSON object",
            MessageFault::InvalidRole => "role must be one of system|user|assistant",
            MessageFault::InvalidContent => {
                "content must be a non-empty string or a non-empty array of valid content items"
            }
        }
    }
}

impl std::fmt::Display for MessageFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a chat request body is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    MalformedBody,

    #[error("messages must be a non-empty array")]
    MissingMessages,

    #[error("Message at index {index} is invalid: {fault}. Received: {received}")]
    InvalidMessage {
        index: usize,
        fault: MessageFault,
        /// Canonical JSON text of the offending element.
        received: String,
    },

    #[error("{field} must be a {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} must be {}, got {actual}", fmt_bound(.min, .max, .actual))]
    RangeViolation {
        field: &'static str,
        min: Option<f64>,
        max: Option<f64>,
        actual: f64,
    },
}

/// Names the bound that `actual` crossed.
fn fmt_bound(min: &Option<f64>, max: &Option<f64>, actual: &f64) -> String {
    match (min, max) {
        (Some(lo), _) if actual < lo => format!(">= {lo}"),
        (_, Some(hi)) if actual > hi => format!("<= {hi}"),
        (Some(lo), Some(hi)) => format!("between {lo} and {hi}"),
        (Some(lo), None) => format!(">= {lo}"),
        (None, Some(hi)) => format!("<= {hi}"),
        (None, None) => "a number".to_string(),
    }
}

impl ValidationError {
    /// Stable machine-readable code for the error.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MalformedBody => "malformed_body",
            ValidationError::MissingMessages => "missing_messages",
            ValidationError::InvalidMessage { .. } => "invalid_message",
            ValidationError::TypeMismatch { .. } => "type_mismatch",
            ValidationError::RangeViolation { .. } => "range_violation",
        }
    }
}

/// Validate a raw Chat Completions body.
///
/// Checks, in order:
/// - the body is a JSON object
/// - `messages` is a non-empty array
/// - every message has a known role and non-empty content (fail-fast on the first bad one)
/// - `stream` is a boolean; sampling fields are numbers inside their ranges
/// - `seed` is a number (no range)
///
/// `model` is carried when it is a string and ignored otherwise.
pub fn validate_chat_body(body: &Value) -> Result<ValidatedChatRequest, ValidationError> {
    let obj = body.as_object().ok_or(ValidationError::MalformedBody)?;

    let raw_messages = match obj.get("messages") {
        Some(Value::Array(arr)) if !arr.is_empty() => arr,
        _ => return Err(ValidationError::MissingMessages),
    };

    let messages = raw_messages
        .iter()
        .enumerate()
        .map(|(index, m)| {
            parse_message(m).map_err(|fault| ValidationError::InvalidMessage {
                index,
                fault,
                received: m.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let stream = optional_bool(obj, "stream")?;
    let temperature = optional_number(
        obj,
        "temperature",
        Some(limits::TEMPERATURE.0),
        Some(limits::TEMPERATURE.1),
    )?;
    let top_p = optional_number(obj, "top_p", Some(limits::TOP_P.0), Some(limits::TOP_P.1))?;
    let max_tokens = optional_number(obj, "max_tokens", Some(limits::MAX_TOKENS_MIN), None)?;
    let presence_penalty = optional_number(
        obj,
        "presence_penalty",
        Some(limits::PRESENCE_PENALTY.0),
        Some(limits::PRESENCE_PENALTY.1),
    )?;
    let frequency_penalty = optional_number(
        obj,
        "frequency_penalty",
        Some(limits::FREQUENCY_PENALTY.0),
        Some(limits::FREQUENCY_PENALTY.1),
    )?;
    let seed = optional_number(obj, "seed", None, None)?;

    let model = obj
        .get("model")
        .and_then(|m| m.as_str())
        .map(|s| s.to_string());

    Ok(ValidatedChatRequest {
        model,
        messages,
        stream,
        temperature,
        top_p,
        max_tokens,
        presence_penalty,
        frequency_penalty,
        seed,
    })
}

/// Pick the upstream model: the requested one when non-empty, else `DEFAULT_MODEL`.
pub fn resolve_model(requested: Option<&str>) -> String {
    match requested {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => DEFAULT_MODEL.to_string(),
    }
}

fn parse_message(v: &Value) -> Result<ChatMessage, MessageFault> {
    let obj = v.as_object().ok_or(MessageFault::NotAnObject)?;

    let role = obj
        .get("role")
        .and_then(|r| r.as_str())
        .and_then(Role::parse)
        .ok_or(MessageFault::InvalidRole)?;

    let content = match obj.get("content") {
        Some(Value::String(s)) if !is_blank(s) => MessageContent::Text(s.clone()),
        Some(Value::Array(items)) if !items.is_empty() => MessageContent::Parts(
            items
                .iter()
                .map(parse_content_item)
                .collect::<Option<Vec<_>>>()
                .ok_or(MessageFault::InvalidContent)?,
        ),
        _ => return Err(MessageFault::InvalidContent),
    };

    Ok(ChatMessage { role, content })
}

/// Empty or made only of whitespace, using the ECMAScript set: Unicode `White_Space`
/// plus U+FEFF, without U+0085.
fn is_blank(s: &str) -> bool {
    s.chars()
        .all(|c| c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{0085}'))
}

/// Returns `None` for an invalid item.
fn parse_content_item(v: &Value) -> Option<ContentItem> {
    let obj = v.as_object()?;
    let kind = obj.get("type")?.as_str()?;

    match kind {
        "text" => {
            let text = obj.get("text")?.as_str()?;
            if is_blank(text) {
                return None;
            }
            Some(ContentItem::Text {
                text: text.to_string(),
            })
        }
        "image_url" => {
            let image = obj.get("image_url")?.as_object()?;
            let url = image.get("url")?.clone();
            let extra: Map<String, Value> = image
                .iter()
                .filter(|(k, _)| k.as_str() != "url")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Some(ContentItem::ImageUrl {
                image_url: ImageUrl { url, extra },
            })
        }
        _ => Some(ContentItem::Other(v.clone())),
    }
}

fn optional_bool(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, ValidationError> {
    match obj.get(field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ValidationError::TypeMismatch {
            field,
            expected: "boolean",
        }),
    }
}

fn optional_number(
    obj: &Map<String, Value>,
    field: &'static str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<Option<Number>, ValidationError> {
    let n = match obj.get(field) {
        None => return Ok(None),
        Some(Value::Number(n)) => n,
        Some(_) => {
            return Err(ValidationError::TypeMismatch {
                field,
                expected: "number",
            })
        }
    };

    // as_f64 is total unless serde_json runs with arbitrary_precision.
    let Some(actual) = n.as_f64() else {
        return Err(ValidationError::TypeMismatch {
            field,
            expected: "number",
        });
    };

    let below = min.is_some_and(|lo| actual < lo);
    let above = max.is_some_and(|hi| actual > hi);
    if below || above {
        return Err(ValidationError::RangeViolation {
            field,
            min,
            max,
            actual,
        });
    }

    Ok(Some(n.clone()))
}
