//! reqwest-backed [`MemoryStore`] speaking the thread REST API.
//!
//! ```text
//! POST {base}/api/v2/threads/{thread}/messages   {"messages": [...]}
//! GET  {base}/api/v2/threads/{thread}/context?mode=facts[&min_rating=0.5]
//! ```

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use tracing::{debug, trace};

use crate::schema::{ContextRequest, StoredMessage, ThreadContext, ThreadId};
use crate::store::{MemoryStore, StoreError};

/// Unreserved characters stay literal inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone)]
pub struct HttpMemoryStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct AddMessagesBody<'a> {
    messages: &'a [StoredMessage],
}

impl HttpMemoryStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base_url = base_url.into();
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Config("base URL is empty".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn thread_url(&self, thread_id: &ThreadId, leaf: &str) -> String {
        let thread = utf8_percent_encode(thread_id.as_str(), PATH_SEGMENT);
        format!("{}/api/v2/threads/{thread}/{leaf}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(reqwest::header::AUTHORIZATION, format!("Api-Key {key}")),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl MemoryStore for HttpMemoryStore {
    async fn add_messages(
        &self,
        thread_id: &ThreadId,
        messages: &[StoredMessage],
    ) -> Result<(), StoreError> {
        let url = self.thread_url(thread_id, "messages");
        debug!(%thread_id, count = messages.len(), "posting messages to memory store");
        let response = self
            .authorize(self.client.post(url))
            .json(&AddMessagesBody { messages })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_user_context(
        &self,
        thread_id: &ThreadId,
        request: &ContextRequest,
    ) -> Result<ThreadContext, StoreError> {
        let url = self.thread_url(thread_id, "context");
        let mut query = vec![("mode", request.mode.as_str().to_string())];
        if let Some(rating) = request.min_fact_rating {
            query.push(("min_rating", rating.to_string()));
        }
        debug!(%thread_id, mode = request.mode.as_str(), "fetching thread context");

        let response = self
            .authorize(self.client.get(url))
            .query(&query)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let raw = response.text().await?;
        trace!(bytes = raw.len(), "thread context received");
        serde_json::from_str(&raw).map_err(|err| StoreError::Decode(err.to_string()))
    }
}
