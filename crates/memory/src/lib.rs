pub mod http;
pub mod instructions;
pub mod message;
pub mod normalize;
pub mod persist;
pub mod retrieval;
pub mod schema;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use http::HttpMemoryStore;
pub use instructions::{ActiveInstructions, FACTS_LEAD_IN, update_instructions};
pub use message::{OutgoingMessage, StructuredMessage};
pub use normalize::{MAX_CONTENT_CHARS, TRUNCATION_MARKER, normalize, normalize_content};
pub use persist::{DEFAULT_USER_NAME, MessagePersister};
pub use retrieval::{FactRetriever, NO_FACTS_FALLBACK};
pub use schema::{ContextMode, ContextRequest, RoleType, StoredMessage, ThreadContext, ThreadId};
pub use store::{MemoryStore, StoreError};
