//! Memory hooks for a conversational agent.
//!
//! A [`MemoryAgent`] mirrors both sides of a conversation into a long-term
//! memory thread and, before each reply, rebuilds its instructions from the
//! facts the store has extracted for that thread.

pub mod error;
pub mod hooks;
pub mod inference;
pub mod orchestrator;

pub use error::{AgentError, Result};
pub use hooks::{AgentId, HookError, HookRegistry, SendHook};
pub use inference::{AgentFunction, FunctionMap, Inference, TurnContext};
pub use orchestrator::{AgentSpec, MemoryAgent, TurnOutcome, TurnPhase};
