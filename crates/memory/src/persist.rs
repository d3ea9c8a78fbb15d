use std::sync::Arc;

use tracing::{debug, info};

use crate::message::OutgoingMessage;
use crate::schema::{StoredMessage, ThreadId};
use crate::store::{MemoryStore, StoreError};

/// Display name recorded for a human who did not give one.
pub const DEFAULT_USER_NAME: &str = "User";

/// Writes conversation messages, in either direction, to one thread.
///
/// Each persisted message is exactly one `add_messages` call.  Nothing is
/// buffered or retried: a store failure is returned as-is.
#[derive(Clone)]
pub struct MessagePersister {
    store: Arc<dyn MemoryStore>,
    thread_id: ThreadId,
}

impl MessagePersister {
    pub fn new(store: Arc<dyn MemoryStore>, thread_id: ThreadId) -> Self {
        Self { store, thread_id }
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    /// Persist a message the agent is sending.
    ///
    /// Returns `Ok(false)` without touching the store when the message has no
    /// text.  The message itself is only read.
    pub async fn persist_outgoing(
        &self,
        message: &OutgoingMessage,
        agent_name: &str,
    ) -> Result<bool, StoreError> {
        let Some(content) = message.text() else {
            debug!(thread_id = %self.thread_id, agent_name, "outgoing message has no content; not persisted");
            return Ok(false);
        };
        self.write(StoredMessage::assistant(content, agent_name)).await?;
        Ok(true)
    }

    /// Persist a message from the human.  `display_name` defaults to
    /// [`DEFAULT_USER_NAME`] and only ever lands in metadata.
    pub async fn persist_incoming(
        &self,
        user_content: &str,
        display_name: Option<&str>,
    ) -> Result<bool, StoreError> {
        if user_content.trim().is_empty() {
            debug!(thread_id = %self.thread_id, "incoming message is empty; not persisted");
            return Ok(false);
        }
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_USER_NAME);
        self.write(StoredMessage::user(user_content, display_name)).await?;
        Ok(true)
    }

    async fn write(&self, message: StoredMessage) -> Result<(), StoreError> {
        self.store
            .add_messages(&self.thread_id, std::slice::from_ref(&message))
            .await?;
        info!(
            thread_id = %self.thread_id,
            role = %message.role_type(),
            content_len = message.content().len(),
            "message persisted"
        );
        Ok(())
    }
}
