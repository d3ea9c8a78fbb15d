use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::{ContextRequest, StoredMessage, ThreadContext, ThreadId};

/// Failure talking to the memory store.  Never retried here; the caller
/// decides whether the turn continues.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("memory store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("memory store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("memory store response could not be decoded: {0}")]
    Decode(String),

    #[error("memory store misconfigured: {0}")]
    Config(String),
}

/// Request/response contract of the remote long-term memory service.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append `messages` to a thread.  Either all of them are accepted or an
    /// error is returned.
    async fn add_messages(
        &self,
        thread_id: &ThreadId,
        messages: &[StoredMessage],
    ) -> Result<(), StoreError>;

    /// Compute the requested view of a thread.
    async fn get_user_context(
        &self,
        thread_id: &ThreadId,
        request: &ContextRequest,
    ) -> Result<ThreadContext, StoreError>;
}

#[async_trait]
impl<T: MemoryStore + ?Sized> MemoryStore for Arc<T> {
    async fn add_messages(
        &self,
        thread_id: &ThreadId,
        messages: &[StoredMessage],
    ) -> Result<(), StoreError> {
        (**self).add_messages(thread_id, messages).await
    }

    async fn get_user_context(
        &self,
        thread_id: &ThreadId,
        request: &ContextRequest,
    ) -> Result<ThreadContext, StoreError> {
        (**self).get_user_context(thread_id, request).await
    }
}
