use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_content;

/// Metadata key carrying the name of the agent that produced a message.
pub const AGENT_NAME_KEY: &str = "agent_name";
/// Metadata key carrying the human's display name.
pub const USER_NAME_KEY: &str = "user_name";

/// Opaque identifier of a conversation thread.  Threads are created and owned
/// by the memory store; this crate only ever references them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ThreadId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which side of the conversation a stored message came from.
///
/// The store accepts only this fixed vocabulary; a human's actual name goes
/// into metadata, never into the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    User,
    Assistant,
}

impl RoleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-format record of one conversational message.
///
/// Built only through [`StoredMessage::user`] and [`StoredMessage::assistant`],
/// which normalize the content, so every instance respects the store's
/// content limit.  There are no mutators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMessage {
    role_type: RoleType,
    role: String,
    content: String,
    metadata: BTreeMap<String, String>,
}

impl StoredMessage {
    pub fn user(content: &str, user_name: &str) -> Self {
        Self::build(RoleType::User, content, USER_NAME_KEY, user_name)
    }

    pub fn assistant(content: &str, agent_name: &str) -> Self {
        Self::build(RoleType::Assistant, content, AGENT_NAME_KEY, agent_name)
    }

    fn build(role_type: RoleType, content: &str, meta_key: &str, meta_value: &str) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(meta_key.to_string(), meta_value.to_string());
        Self {
            role_type,
            role: role_type.as_str().to_string(),
            content: normalize_content(content).into_owned(),
            metadata,
        }
    }

    pub fn role_type(&self) -> RoleType {
        self.role_type
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// Which view of a thread the store should compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    #[default]
    Facts,
    Summary,
}

impl ContextMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facts => "facts",
            Self::Summary => "summary",
        }
    }
}

/// Parameters of a context read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContextRequest {
    pub mode: ContextMode,
    /// Forwarded verbatim; filtering by rating is the store's business.
    pub min_fact_rating: Option<f32>,
}

/// Store reply to a context read.  `context` is absent for new or empty
/// threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadContext {
    #[serde(default)]
    pub context: Option<String>,
}
