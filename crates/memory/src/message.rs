use serde::{Deserialize, Serialize};

/// A message the agent is about to send.
///
/// Host frameworks hand these over either as a bare string or as a
/// chat-style object; both shapes deserialize into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Plain(String),
    Structured(StructuredMessage),
}

/// Chat-style message object.  Only `content` matters to the memory hooks;
/// anything else the framework attaches is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OutgoingMessage {
    /// Textual content, or `None` when the message carries nothing worth
    /// remembering (missing, empty or whitespace-only).
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            Self::Plain(text) => text.as_str(),
            Self::Structured(message) => message.content.as_deref()?,
        };
        (!text.trim().is_empty()).then_some(text)
    }
}

impl From<String> for OutgoingMessage {
    fn from(text: String) -> Self {
        Self::Plain(text)
    }
}

impl From<&str> for OutgoingMessage {
    fn from(text: &str) -> Self {
        Self::Plain(text.to_string())
    }
}

impl From<StructuredMessage> for OutgoingMessage {
    fn from(message: StructuredMessage) -> Self {
        Self::Structured(message)
    }
}
