use serde::{Deserialize, Serialize};
use serde_json::Number;
use serde_with::skip_serializing_none;

/// Upstream chat message. Content is always a flat string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
}

/// Request body for the upstream `POST /chat/completions` call.
///
/// Field names match the upstream schema verbatim. `stream` is always present;
/// the sampling fields are omitted when absent so the upstream defaults apply.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamPayload {
    pub model: String,
    pub messages: Vec<UpstreamMessage>,
    pub stream: bool,

    // Sampling / decoding
    #[serde(default)]
    pub temperature: Option<Number>,
    #[serde(default)]
    pub top_p: Option<Number>,
    #[serde(default)]
    pub max_tokens: Option<Number>,
    #[serde(default)]
    pub presence_penalty: Option<Number>,
    #[serde(default)]
    pub frequency_penalty: Option<Number>,
    #[serde(default)]
    pub seed: Option<Number>,
}

/// Entry of the `/v1/models` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: String,
    pub object: String, // "model"
    pub created: u64,
    pub owned_by: String,
}

/// Response body of `GET /v1/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String, // "list"
    pub data: Vec<ModelObject>,
}

impl ModelsResponse {
    pub fn from_ids<I, S>(ids: I, created: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data = ids
            .into_iter()
            .map(|id| ModelObject {
                id: id.into(),
                object: "model".into(),
                created,
                owned_by: "upstream".into(),
            })
            .collect();
        ModelsResponse {
            object: "list".into(),
            data,
        }
    }
}
