//! In-process [`MemoryStore`] double that records every call.
//!
//! Compiled for this crate's tests and, through the `test-utils` feature, for
//! downstream crates' tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::schema::{ContextRequest, StoredMessage, ThreadContext, ThreadId};
use crate::store::{MemoryStore, StoreError};

/// One call observed by a [`RecordingStore`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    AddMessages { thread_id: ThreadId, count: usize },
    GetUserContext { thread_id: ThreadId },
}

#[derive(Debug, Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    writes: Mutex<Vec<(ThreadId, Vec<StoredMessage>)>>,
    reads: Mutex<Vec<(ThreadId, ContextRequest)>>,
    context: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

fn unavailable() -> StoreError {
    StoreError::Status {
        status: 503,
        body: "memory store unavailable".to_string(),
    }
}

impl RecordingStore {
    /// Context returned by subsequent reads.
    pub fn set_context(&self, context: Option<&str>) {
        *self.context.lock().unwrap_or_else(|e| e.into_inner()) = context.map(str::to_string);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Every call, successful or not.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Accepted writes only.
    pub fn writes(&self) -> Vec<(ThreadId, Vec<StoredMessage>)> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every message accepted, flattened across writes.
    pub fn messages(&self) -> Vec<StoredMessage> {
        self.writes()
            .into_iter()
            .flat_map(|(_, messages)| messages)
            .collect()
    }

    pub fn reads(&self) -> Vec<(ThreadId, ContextRequest)> {
        self.reads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

#[async_trait]
impl MemoryStore for RecordingStore {
    async fn add_messages(
        &self,
        thread_id: &ThreadId,
        messages: &[StoredMessage],
    ) -> Result<(), StoreError> {
        self.record(StoreCall::AddMessages {
            thread_id: thread_id.clone(),
            count: messages.len(),
        });
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((thread_id.clone(), messages.to_vec()));
        Ok(())
    }

    async fn get_user_context(
        &self,
        thread_id: &ThreadId,
        request: &ContextRequest,
    ) -> Result<ThreadContext, StoreError> {
        self.record(StoreCall::GetUserContext {
            thread_id: thread_id.clone(),
        });
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((thread_id.clone(), *request));
        Ok(ThreadContext {
            context: self.context.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        })
    }
}
