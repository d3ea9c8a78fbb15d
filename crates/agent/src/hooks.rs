use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use mnemo_memory::{OutgoingMessage, StoreError};

// ── Sender identity ──────────────────────────────────────────────────────────

/// Identity of one agent instance.  Two agents with the same name still have
/// different ids, so relayed messages can be told apart from an agent's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Post-send hook ───────────────────────────────────────────────────────────

/// A post-send hook could not do its work.  The message is handed back so the
/// caller can still deliver it.
#[derive(Debug, Error)]
#[error("post-send hook failed: {source}")]
pub struct HookError {
    pub message: OutgoingMessage,
    #[source]
    pub source: StoreError,
}

/// Observer invoked by the host framework for every message an agent emits.
#[async_trait]
pub trait SendHook: Send + Sync {
    /// Called with the emitting agent and its message.  Returns the message
    /// to deliver.
    async fn on_outgoing_message(
        &self,
        sender: &AgentId,
        message: OutgoingMessage,
    ) -> Result<OutgoingMessage, HookError>;
}

/// Post-send hooks registered with a host, run in registration order.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn SendHook>>,
}

impl HookRegistry {
    pub fn register(&mut self, hook: Arc<dyn SendHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Whether `hook` itself (not just an equal one) is registered.
    pub fn contains(&self, hook: &dyn SendHook) -> bool {
        self.hooks
            .iter()
            .any(|registered| std::ptr::addr_eq(Arc::as_ptr(registered), hook as *const dyn SendHook))
    }

    /// Pass `message` through every hook in order.  The first failure ends
    /// dispatch: hooks registered after the failing one do not see the
    /// message, and the error carries it back to the caller.
    pub async fn dispatch(
        &self,
        sender: &AgentId,
        message: OutgoingMessage,
    ) -> Result<OutgoingMessage, HookError> {
        let mut message = message;
        for hook in &self.hooks {
            message = hook.on_outgoing_message(sender, message).await?;
        }
        Ok(message)
    }
}
