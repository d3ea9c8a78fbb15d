//! Turn orchestration: wires the persister, the fact retriever and the
//! instruction updater into an agent's message lifecycle.
//!
//! ```text
//! Idle ─notify_incoming─▶ IncomingPersisted ─refresh_instructions─▶ FactsFetched
//!      ─▶ InstructionsUpdated ─infer─▶ InferenceRunning ─post-send hook─▶
//!      OutgoingPersisted ─▶ Idle
//! ```
//!
//! Every store call is awaited before the next step starts, so within one turn
//! the incoming write precedes the fact read, which precedes the instruction
//! update, which precedes inference.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, instrument, trace, warn};

use mnemo_config::{AppConfig, HumanInputMode, MemoryFailurePolicy};
use mnemo_memory::{
    ActiveInstructions, FactRetriever, MemoryStore, MessagePersister, NO_FACTS_FALLBACK,
    OutgoingMessage, StoreError, ThreadId, update_instructions,
};

use crate::error::{AgentError, Result};
use crate::hooks::{AgentId, HookError, HookRegistry, SendHook};
use crate::inference::{FunctionMap, Inference, TurnContext};

// ── Construction ─────────────────────────────────────────────────────────────

/// Everything the host supplies when creating a memory-backed agent.
pub struct AgentSpec {
    pub name: String,
    /// Base instructions.  Never modified after construction.
    pub instructions: String,
    /// Passed through to inference untouched.
    pub inference_config: serde_json::Value,
    pub functions: FunctionMap,
    pub human_input_mode: HumanInputMode,
    pub thread_id: ThreadId,
    /// Forwarded with every fact query; not enforced here.
    pub min_fact_rating: f32,
    pub failure_policy: MemoryFailurePolicy,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>, thread_id: ThreadId) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            inference_config: serde_json::Value::Null,
            functions: FunctionMap::new(),
            human_input_mode: HumanInputMode::default(),
            thread_id,
            min_fact_rating: 0.0,
            failure_policy: MemoryFailurePolicy::default(),
        }
    }

    /// Settings taken from the `[agent]` and `[memory]` config sections.
    pub fn from_config(config: &AppConfig, thread_id: ThreadId) -> Self {
        Self {
            human_input_mode: config.agent.human_input_mode,
            min_fact_rating: config.memory.min_fact_rating,
            failure_policy: config.memory.failure_policy,
            ..Self::new(&config.agent.name, &config.agent.instructions, thread_id)
        }
    }
}

// ── Turn state ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    /// The incoming step finished.  A blank message is skipped without a
    /// store write but still advances the turn to this phase.
    IncomingPersisted,
    FactsFetched,
    InstructionsUpdated,
    InferenceRunning,
    OutgoingPersisted,
}

/// Result of [`MemoryAgent::run_turn`].
#[derive(Debug)]
pub struct TurnOutcome {
    /// The reply as delivered after the post-send hooks ran.
    pub reply: OutgoingMessage,
    /// Instructions inference ran with.
    pub instructions: ActiveInstructions,
    /// Store failures tolerated under [`MemoryFailurePolicy::ProceedStale`].
    pub memory_errors: Vec<StoreError>,
}

struct TurnState {
    phase: TurnPhase,
    /// Most recent successfully derived instructions.  Only read as the
    /// fallback when a later refresh fails.
    last_good: Option<ActiveInstructions>,
}

// ── Agent ────────────────────────────────────────────────────────────────────

/// An agent whose conversation is mirrored into a long-term memory thread.
pub struct MemoryAgent {
    id: AgentId,
    name: String,
    original_instructions: String,
    inference_config: serde_json::Value,
    functions: FunctionMap,
    human_input_mode: HumanInputMode,
    failure_policy: MemoryFailurePolicy,
    persister: MessagePersister,
    retriever: FactRetriever,
    state: Mutex<TurnState>,
}

impl MemoryAgent {
    /// Build the agent and register its post-send hook with `hooks`.
    pub fn new(
        spec: AgentSpec,
        store: Arc<dyn MemoryStore>,
        hooks: &mut HookRegistry,
    ) -> Arc<Self> {
        let agent = Arc::new(Self {
            id: AgentId::new(),
            name: spec.name,
            original_instructions: spec.instructions,
            inference_config: spec.inference_config,
            functions: spec.functions,
            human_input_mode: spec.human_input_mode,
            failure_policy: spec.failure_policy,
            persister: MessagePersister::new(store.clone(), spec.thread_id),
            retriever: FactRetriever::new(store).with_min_fact_rating(spec.min_fact_rating),
            state: Mutex::new(TurnState {
                phase: TurnPhase::Idle,
                last_good: None,
            }),
        });
        hooks.register(agent.clone());
        info!(
            agent = %agent.name,
            id = %agent.id,
            thread_id = %agent.thread_id(),
            "memory agent registered"
        );
        agent
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thread_id(&self) -> &ThreadId {
        self.persister.thread_id()
    }

    pub fn original_instructions(&self) -> &str {
        &self.original_instructions
    }

    pub fn phase(&self) -> TurnPhase {
        self.state().phase
    }

    /// Instructions from the latest successful refresh, if any.
    pub fn active_instructions(&self) -> Option<ActiveInstructions> {
        self.state().last_good.clone()
    }

    fn state(&self) -> MutexGuard<'_, TurnState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: TurnPhase) {
        let mut state = self.state();
        trace!(agent = %self.name, from = ?state.phase, to = ?phase, "turn phase");
        state.phase = phase;
    }

    // ── Entry points ─────────────────────────────────────────────────────────

    /// Persist a human message.  Call before [`Self::refresh_instructions`]
    /// so the fact query already sees it.  Returns whether anything was
    /// written.
    #[instrument(skip(self, user_text), fields(agent = %self.name, thread_id = %self.thread_id()))]
    pub async fn notify_incoming(
        &self,
        user_text: &str,
        display_name: Option<&str>,
    ) -> std::result::Result<bool, StoreError> {
        match self.persister.persist_incoming(user_text, display_name).await {
            Ok(written) => {
                self.set_phase(TurnPhase::IncomingPersisted);
                Ok(written)
            }
            Err(err) => {
                self.set_phase(TurnPhase::Idle);
                Err(err)
            }
        }
    }

    /// Fetch the thread's facts and derive this turn's instructions from the
    /// base instructions.  Inference must not start before this returns.
    #[instrument(skip(self), fields(agent = %self.name, thread_id = %self.thread_id()))]
    pub async fn refresh_instructions(&self) -> std::result::Result<ActiveInstructions, StoreError> {
        let facts = match self.retriever.fetch_context(self.thread_id()).await {
            Ok(facts) => facts,
            Err(err) => {
                self.set_phase(TurnPhase::Idle);
                return Err(err);
            }
        };
        self.set_phase(TurnPhase::FactsFetched);

        let active = update_instructions(&self.original_instructions, &facts);
        {
            let mut state = self.state();
            state.last_good = Some(active.clone());
            state.phase = TurnPhase::InstructionsUpdated;
        }
        info!(
            facts_recalled = facts != NO_FACTS_FALLBACK,
            instructions_len = active.as_str().len(),
            "instructions refreshed"
        );
        Ok(active)
    }

    /// Run one full turn: persist the human message, refresh instructions,
    /// run inference with them, then emit the reply through `hooks`.  The
    /// reply is persisted even when `hooks` does not hold this agent's hook.
    #[instrument(skip(self, user_text, inference, hooks), fields(agent = %self.name, thread_id = %self.thread_id()))]
    pub async fn run_turn(
        &self,
        user_text: &str,
        display_name: Option<&str>,
        inference: &dyn Inference,
        hooks: &HookRegistry,
    ) -> Result<TurnOutcome> {
        let mut memory_errors = Vec::new();

        if let Err(err) = self.notify_incoming(user_text, display_name).await {
            self.tolerate(err, &mut memory_errors)?;
        }

        let instructions = match self.refresh_instructions().await {
            Ok(active) => active,
            Err(err) => {
                self.tolerate(err, &mut memory_errors)?;
                self.stale_instructions()
            }
        };

        self.set_phase(TurnPhase::InferenceRunning);
        let reply = inference
            .infer(TurnContext {
                agent_name: &self.name,
                instructions: &instructions,
                user_message: user_text,
                inference_config: &self.inference_config,
                functions: &self.functions,
                human_input_mode: self.human_input_mode,
            })
            .await;
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                self.set_phase(TurnPhase::Idle);
                return Err(AgentError::Inference(err));
            }
        };

        let mut reply = match hooks.dispatch(&self.id, reply).await {
            Ok(reply) => reply,
            Err(HookError { message, source }) => {
                self.tolerate(source, &mut memory_errors)?;
                message
            }
        };
        if !hooks.contains(self) {
            debug!(agent = %self.name, "own hook not in registry; persisting reply directly");
            reply = match self.on_outgoing_message(&self.id, reply).await {
                Ok(reply) => reply,
                Err(HookError { message, source }) => {
                    self.tolerate(source, &mut memory_errors)?;
                    message
                }
            };
        }
        self.set_phase(TurnPhase::Idle);

        Ok(TurnOutcome {
            reply,
            instructions,
            memory_errors,
        })
    }

    /// Apply the failure policy to a store error raised mid-turn.
    fn tolerate(&self, err: StoreError, tolerated: &mut Vec<StoreError>) -> Result<()> {
        match self.failure_policy {
            MemoryFailurePolicy::Abort => {
                self.set_phase(TurnPhase::Idle);
                Err(err.into())
            }
            MemoryFailurePolicy::ProceedStale => {
                warn!(agent = %self.name, error = %err, "memory store failure; continuing turn");
                tolerated.push(err);
                Ok(())
            }
        }
    }

    fn stale_instructions(&self) -> ActiveInstructions {
        self.active_instructions()
            .unwrap_or_else(|| update_instructions(&self.original_instructions, NO_FACTS_FALLBACK))
    }
}

#[async_trait]
impl SendHook for MemoryAgent {
    /// Persist the message when this agent is the sender.  Messages from any
    /// other agent pass through without a store write.
    async fn on_outgoing_message(
        &self,
        sender: &AgentId,
        message: OutgoingMessage,
    ) -> std::result::Result<OutgoingMessage, HookError> {
        if *sender != self.id {
            debug!(agent = %self.name, %sender, "message from another sender; not persisted");
            return Ok(message);
        }

        match self.persister.persist_outgoing(&message, &self.name).await {
            Ok(_) => {
                self.set_phase(TurnPhase::OutgoingPersisted);
                self.set_phase(TurnPhase::Idle);
                Ok(message)
            }
            Err(source) => {
                self.set_phase(TurnPhase::Idle);
                Err(HookError { message, source })
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::AgentFunction;
    use mnemo_memory::testing::{RecordingStore, StoreCall};
    use mnemo_memory::{FACTS_LEAD_IN, RoleType};
    use serde_json::json;

    const BASE: &str = "You are a barista bot.";

    /// What inference observed when it was invoked.
    #[derive(Debug, Clone)]
    struct Observed {
        instructions: String,
        user_message: String,
        calls_before: Vec<StoreCall>,
        human_input_mode: HumanInputMode,
        functions: Vec<String>,
        config: serde_json::Value,
    }

    struct ScriptedInference {
        store: Arc<RecordingStore>,
        reply: String,
        fail: bool,
        seen: Mutex<Vec<Observed>>,
    }

    impl ScriptedInference {
        fn new(store: &Arc<RecordingStore>, reply: &str) -> Self {
            Self {
                store: store.clone(),
                reply: reply.to_string(),
                fail: false,
                seen: Mutex::default(),
            }
        }

        fn seen(&self) -> Vec<Observed> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Inference for ScriptedInference {
        async fn infer(&self, turn: TurnContext<'_>) -> anyhow::Result<OutgoingMessage> {
            let mut functions: Vec<String> = turn.functions.keys().cloned().collect();
            functions.sort();
            self.seen.lock().unwrap().push(Observed {
                instructions: turn.instructions.to_string(),
                user_message: turn.user_message.to_string(),
                calls_before: self.store.calls(),
                human_input_mode: turn.human_input_mode,
                functions,
                config: turn.inference_config.clone(),
            });
            if self.fail {
                anyhow::bail!("model offline");
            }
            Ok(OutgoingMessage::from(self.reply.as_str()))
        }
    }

    fn thread() -> ThreadId {
        ThreadId::new("thread-barista")
    }

    fn agent_with(
        store: &Arc<RecordingStore>,
        hooks: &mut HookRegistry,
        policy: MemoryFailurePolicy,
    ) -> Arc<MemoryAgent> {
        let mut spec = AgentSpec::new("Barista", BASE, thread());
        spec.failure_policy = policy;
        MemoryAgent::new(spec, store.clone(), hooks)
    }

    fn expected(facts: &str) -> String {
        format!("{BASE}\n\n{FACTS_LEAD_IN}:\n{facts}")
    }

    #[tokio::test]
    async fn construction_registers_hook_and_starts_idle() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        assert_eq!(hooks.len(), 1);
        assert_eq!(agent.phase(), TurnPhase::Idle);
        assert_eq!(agent.thread_id(), &thread());
        assert!(agent.active_instructions().is_none());
    }

    #[tokio::test]
    async fn turn_steps_run_in_order() {
        let store = Arc::new(RecordingStore::default());
        store.set_context(Some("- likes oat milk"));
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let inference = ScriptedInference::new(&store, "One oat latte coming up.");

        let outcome = agent
            .run_turn("The usual, please", Some("Sam"), &inference, &hooks)
            .await
            .unwrap();

        let seen = inference.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].calls_before,
            vec![
                StoreCall::AddMessages { thread_id: thread(), count: 1 },
                StoreCall::GetUserContext { thread_id: thread() },
            ]
        );
        assert_eq!(seen[0].instructions, expected("- likes oat milk"));
        assert_eq!(seen[0].user_message, "The usual, please");

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role_type(), RoleType::User);
        assert_eq!(messages[0].content(), "The usual, please");
        assert_eq!(messages[1].role_type(), RoleType::Assistant);
        assert_eq!(messages[1].content(), "One oat latte coming up.");

        assert_eq!(outcome.reply, OutgoingMessage::from("One oat latte coming up."));
        assert_eq!(outcome.instructions.as_str(), expected("- likes oat milk"));
        assert!(outcome.memory_errors.is_empty());
        assert_eq!(agent.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn empty_facts_inject_fallback() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);

        let active = agent.refresh_instructions().await.unwrap();
        assert_eq!(
            active.as_str(),
            format!("{BASE}\n\n{FACTS_LEAD_IN}:\nNo specific facts recalled.")
        );
        assert_eq!(agent.phase(), TurnPhase::InstructionsUpdated);
    }

    #[tokio::test]
    async fn facts_are_replaced_between_turns() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let inference = ScriptedInference::new(&store, "Noted.");

        store.set_context(Some("likes tea"));
        agent.run_turn("hi", None, &inference, &hooks).await.unwrap();
        store.set_context(Some("likes coffee"));
        let outcome = agent.run_turn("hi again", None, &inference, &hooks).await.unwrap();

        let last = outcome.instructions.as_str();
        assert!(last.contains("coffee"));
        assert!(!last.contains("tea"));
        assert_eq!(last, expected("likes coffee"));
        assert_eq!(agent.active_instructions().unwrap().as_str(), last);
        assert_eq!(agent.original_instructions(), BASE);
    }

    #[tokio::test]
    async fn hook_ignores_messages_from_other_senders() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);

        let relayed = hooks
            .dispatch(&AgentId::new(), OutgoingMessage::from("relayed text"))
            .await
            .unwrap();
        assert_eq!(relayed, OutgoingMessage::from("relayed text"));
        assert!(store.writes().is_empty());

        hooks
            .dispatch(&agent.id(), OutgoingMessage::from("my own words"))
            .await
            .unwrap();
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content(), "my own words");
    }

    #[tokio::test]
    async fn reply_is_persisted_through_a_foreign_registry() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let inference = ScriptedInference::new(&store, "reply worth keeping");

        let outcome = agent
            .run_turn("hi", None, &inference, &HookRegistry::default())
            .await
            .unwrap();

        let roles: Vec<RoleType> = store.messages().iter().map(|m| m.role_type()).collect();
        assert_eq!(roles, vec![RoleType::User, RoleType::Assistant]);
        assert_eq!(store.messages()[1].content(), "reply worth keeping");
        assert!(outcome.memory_errors.is_empty());
    }

    #[tokio::test]
    async fn reply_is_persisted_once_through_own_registry() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let inference = ScriptedInference::new(&store, "only once");

        agent.run_turn("hi", None, &inference, &hooks).await.unwrap();
        assert_eq!(store.messages().len(), 2);
    }

    #[tokio::test]
    async fn foreign_registry_write_failure_follows_policy() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::ProceedStale);
        let inference = ScriptedInference::new(&store, "kept anyway");

        store.fail_writes(true);
        let outcome = agent
            .run_turn("hi", None, &inference, &HookRegistry::default())
            .await
            .unwrap();
        // incoming write and reply write
        assert_eq!(outcome.memory_errors.len(), 2);
        assert_eq!(outcome.reply, OutgoingMessage::from("kept anyway"));
    }

    #[tokio::test]
    async fn same_named_agents_do_not_double_persist() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let first = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let _second = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);

        hooks
            .dispatch(&first.id(), OutgoingMessage::from("said once"))
            .await
            .unwrap();
        assert_eq!(store.messages().len(), 1);
    }

    #[tokio::test]
    async fn empty_reply_is_not_persisted() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let inference = ScriptedInference::new(&store, "   ");

        agent.run_turn("", None, &inference, &hooks).await.unwrap();
        assert!(store.writes().is_empty());
        assert_eq!(inference.seen().len(), 1);
    }

    #[tokio::test]
    async fn abort_policy_stops_turn_before_inference() {
        let store = Arc::new(RecordingStore::default());
        store.fail_reads(true);
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let inference = ScriptedInference::new(&store, "unused");

        let err = agent
            .run_turn("hello", None, &inference, &hooks)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Store(StoreError::Status { status: 503, .. })));
        assert!(inference.seen().is_empty());
        assert_eq!(agent.phase(), TurnPhase::Idle);
        assert_eq!(store.messages().len(), 1);
    }

    #[tokio::test]
    async fn proceed_stale_reuses_last_good_instructions() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::ProceedStale);
        let inference = ScriptedInference::new(&store, "ok");

        store.set_context(Some("likes tea"));
        agent.run_turn("turn one", None, &inference, &hooks).await.unwrap();

        store.fail_reads(true);
        let outcome = agent.run_turn("turn two", None, &inference, &hooks).await.unwrap();
        assert_eq!(outcome.memory_errors.len(), 1);
        assert_eq!(outcome.instructions.as_str(), expected("likes tea"));
        assert_eq!(inference.seen().len(), 2);
    }

    #[tokio::test]
    async fn proceed_stale_without_history_uses_fallback() {
        let store = Arc::new(RecordingStore::default());
        store.fail_reads(true);
        store.fail_writes(true);
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::ProceedStale);
        let inference = ScriptedInference::new(&store, "still here");

        let outcome = agent.run_turn("hello?", None, &inference, &hooks).await.unwrap();
        // incoming write, fact read and outgoing write all failed
        assert_eq!(outcome.memory_errors.len(), 3);
        assert_eq!(outcome.instructions.as_str(), expected(NO_FACTS_FALLBACK));
        assert_eq!(outcome.reply, OutgoingMessage::from("still here"));
        assert_eq!(agent.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn abort_policy_surfaces_outgoing_failure_with_message() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);

        store.fail_writes(true);
        let err = hooks
            .dispatch(&agent.id(), OutgoingMessage::from("undelivered?"))
            .await
            .unwrap_err();
        assert_eq!(err.message, OutgoingMessage::from("undelivered?"));
        assert_eq!(agent.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn inference_failure_skips_outgoing_persist() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);
        let mut inference = ScriptedInference::new(&store, "never");
        inference.fail = true;

        let err = agent.run_turn("hi", None, &inference, &hooks).await.unwrap_err();
        assert!(matches!(err, AgentError::Inference(_)));
        assert_eq!(store.messages().len(), 1);
        assert_eq!(agent.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn opaque_settings_reach_inference() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let mut spec = AgentSpec::new("Barista", BASE, thread());
        spec.inference_config = json!({"model": "small", "temperature": 0.2});
        spec.human_input_mode = HumanInputMode::Never;
        let menu: AgentFunction =
            Arc::new(|_args: serde_json::Value| -> anyhow::Result<serde_json::Value> {
                Ok(json!(["latte", "mocha"]))
            });
        spec.functions.insert("menu".to_string(), menu);
        let agent = MemoryAgent::new(spec, store.clone(), &mut hooks);
        let inference = ScriptedInference::new(&store, "ok");

        agent.run_turn("menu?", None, &inference, &hooks).await.unwrap();
        let seen = &inference.seen()[0];
        assert_eq!(seen.config["model"], "small");
        assert_eq!(seen.human_input_mode, HumanInputMode::Never);
        assert_eq!(seen.functions, vec!["menu".to_string()]);
    }

    #[tokio::test]
    async fn min_fact_rating_is_forwarded() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let mut spec = AgentSpec::new("Barista", BASE, thread());
        spec.min_fact_rating = 0.4;
        let agent = MemoryAgent::new(spec, store.clone(), &mut hooks);

        agent.refresh_instructions().await.unwrap();
        assert_eq!(store.reads()[0].1.min_fact_rating, Some(0.4));
    }

    #[tokio::test]
    async fn notify_incoming_tracks_phase_even_for_blank_text() {
        let store = Arc::new(RecordingStore::default());
        let mut hooks = HookRegistry::default();
        let agent = agent_with(&store, &mut hooks, MemoryFailurePolicy::Abort);

        assert!(!agent.notify_incoming("  ", Some("Sam")).await.unwrap());
        assert_eq!(agent.phase(), TurnPhase::IncomingPersisted);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn spec_from_config() {
        let mut config = AppConfig::default();
        config.agent.name = "Concierge".to_string();
        config.agent.human_input_mode = HumanInputMode::Terminate;
        config.memory.min_fact_rating = 0.25;
        config.memory.failure_policy = MemoryFailurePolicy::ProceedStale;

        let spec = AgentSpec::from_config(&config, ThreadId::new("t"));
        assert_eq!(spec.name, "Concierge");
        assert_eq!(spec.instructions, config.agent.instructions);
        assert_eq!(spec.human_input_mode, HumanInputMode::Terminate);
        assert!((spec.min_fact_rating - 0.25).abs() < f32::EPSILON);
        assert_eq!(spec.failure_policy, MemoryFailurePolicy::ProceedStale);
    }
}
