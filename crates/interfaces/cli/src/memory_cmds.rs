use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use mnemo_agent::{AgentSpec, HookRegistry, MemoryAgent};
use mnemo_config::AppConfig;
use mnemo_memory::{
    FactRetriever, HttpMemoryStore, MemoryStore, MessagePersister, OutgoingMessage, ThreadId,
};

/// `--thread` if given, otherwise `store.thread_id` from config.
pub(crate) fn resolve_thread(config: &AppConfig, flag: Option<String>) -> Result<ThreadId> {
    let id = flag.unwrap_or_else(|| config.store.thread_id.clone());
    let id = id.trim();
    if id.is_empty() {
        bail!("no thread given: pass --thread or set store.thread_id in the config");
    }
    debug!(thread_id = id, "thread resolved");
    Ok(ThreadId::new(id))
}

pub(crate) fn parse_reply(text: &str, json: bool) -> Result<OutgoingMessage> {
    if !json {
        return Ok(OutgoingMessage::from(text));
    }
    serde_json::from_str(text).context("reply is not a JSON string or message object")
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn MemoryStore>> {
    let store = HttpMemoryStore::new(
        &config.store.base_url,
        config.api_key().map(str::to_string),
        Duration::from_secs(config.store.timeout_secs),
    )
    .with_context(|| format!("open memory store at {}", config.store.base_url))?;
    debug!(
        base_url = %config.store.base_url,
        authenticated = config.api_key().is_some(),
        timeout_secs = config.store.timeout_secs,
        "memory store opened"
    );
    Ok(Arc::new(store))
}

pub(crate) async fn run_remember(
    config: &AppConfig,
    thread: ThreadId,
    as_name: Option<&str>,
    text: &str,
) -> Result<()> {
    let persister = MessagePersister::new(open_store(config)?, thread.clone());
    let display_name = as_name.unwrap_or(&config.agent.user_name);
    let written = persister
        .persist_incoming(text, Some(display_name))
        .await
        .with_context(|| format!("persist message to thread {thread}"))?;

    if written {
        println!("remembered message from {display_name} in thread {thread}");
    } else {
        println!("nothing to remember: message is empty");
    }
    Ok(())
}

pub(crate) async fn run_reply(
    config: &AppConfig,
    thread: ThreadId,
    message: OutgoingMessage,
) -> Result<()> {
    let mut hooks = HookRegistry::default();
    let agent = MemoryAgent::new(
        AgentSpec::from_config(config, thread.clone()),
        open_store(config)?,
        &mut hooks,
    );

    let delivered = hooks
        .dispatch(&agent.id(), message)
        .await
        .with_context(|| format!("persist reply to thread {thread}"))?;

    match delivered.text() {
        Some(text) => println!("{}: {text}", agent.name()),
        None => println!("nothing to persist: reply is empty"),
    }
    Ok(())
}

pub(crate) async fn run_facts(config: &AppConfig, thread: ThreadId) -> Result<()> {
    let retriever =
        FactRetriever::new(open_store(config)?).with_min_fact_rating(config.memory.min_fact_rating);
    let facts = retriever
        .fetch_context(&thread)
        .await
        .with_context(|| format!("fetch facts for thread {thread}"))?;

    println!("── facts: {thread} ──────────────────────────────────");
    println!("{facts}");
    Ok(())
}

pub(crate) async fn run_instructions(config: &AppConfig, thread: ThreadId) -> Result<()> {
    let mut hooks = HookRegistry::default();
    let agent = MemoryAgent::new(
        AgentSpec::from_config(config, thread.clone()),
        open_store(config)?,
        &mut hooks,
    );
    let active = agent
        .refresh_instructions()
        .await
        .with_context(|| format!("refresh instructions for thread {thread}"))?;

    println!("── instructions: {} ─────────────────────────────────", agent.name());
    println!("{active}");
    Ok(())
}
