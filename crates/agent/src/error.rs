use thiserror::Error;

use mnemo_memory::StoreError;

use crate::hooks::HookError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("inference failed: {0}")]
    Inference(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
