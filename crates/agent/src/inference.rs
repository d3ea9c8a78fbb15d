//! Seam between the memory hooks and the host's reasoning loop.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use mnemo_config::HumanInputMode;
use mnemo_memory::{ActiveInstructions, OutgoingMessage};

/// A function the agent may call during inference.  Opaque to the memory
/// hooks; only carried through to [`Inference`].
pub type AgentFunction =
    Arc<dyn Fn(serde_json::Value) -> Result<serde_json::Value> + Send + Sync>;

pub type FunctionMap = HashMap<String, AgentFunction>;

/// Everything inference needs for one turn.  The instructions are the ones
/// derived for this turn, passed in explicitly.
pub struct TurnContext<'a> {
    pub agent_name: &'a str,
    pub instructions: &'a ActiveInstructions,
    pub user_message: &'a str,
    pub inference_config: &'a serde_json::Value,
    pub functions: &'a FunctionMap,
    pub human_input_mode: HumanInputMode,
}

/// The host's reasoning loop.  Produces the agent's reply for a turn.
#[async_trait]
pub trait Inference: Send + Sync {
    async fn infer(&self, turn: TurnContext<'_>) -> Result<OutgoingMessage>;
}
