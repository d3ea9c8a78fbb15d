use std::sync::Arc;

use tracing::{debug, trace};

use crate::schema::{ContextMode, ContextRequest, ThreadId};
use crate::store::{MemoryStore, StoreError};

/// Returned in place of facts for a thread the store knows nothing about yet.
pub const NO_FACTS_FALLBACK: &str = "No specific facts recalled.";

/// Reads the store's "facts" view of a thread.
#[derive(Clone)]
pub struct FactRetriever {
    store: Arc<dyn MemoryStore>,
    min_fact_rating: Option<f32>,
}

impl FactRetriever {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            min_fact_rating: None,
        }
    }

    /// Threshold forwarded with every query.  Not applied locally.
    pub fn with_min_fact_rating(mut self, rating: f32) -> Self {
        self.min_fact_rating = Some(rating);
        self
    }

    /// One read of the thread's facts.  Never returns empty text: a missing or
    /// blank context becomes [`NO_FACTS_FALLBACK`].
    pub async fn fetch_context(&self, thread_id: &ThreadId) -> Result<String, StoreError> {
        let request = ContextRequest {
            mode: ContextMode::Facts,
            min_fact_rating: self.min_fact_rating,
        };
        let response = self.store.get_user_context(thread_id, &request).await?;

        match response.context {
            Some(context) if !context.trim().is_empty() => {
                trace!(%thread_id, len = context.len(), "facts recalled");
                Ok(context)
            }
            _ => {
                debug!(%thread_id, "no facts recalled for thread");
                Ok(NO_FACTS_FALLBACK.to_string())
            }
        }
    }
}
