use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ── Agent behaviour ──────────────────────────────────────────────────────────

/// When the host framework should ask a human for input instead of letting
/// the agent reply on its own.  Carried through to the inference loop; the
/// memory hooks never act on it.
///
/// | Mode        | Behaviour                                                |
/// |-------------|----------------------------------------------------------|
/// | `always`    | Every turn waits for a human reply.                      |
/// | `terminate` | A human is asked only when the conversation would end.   |
/// | `never`     | The agent runs fully autonomously.                       |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanInputMode {
    #[default]
    Always,
    Terminate,
    Never,
}

/// What a turn does when the memory store cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryFailurePolicy {
    /// Propagate the first store failure and abandon the turn.
    #[default]
    Abort,
    /// Log the failure, skip the failed memory step and run inference with the
    /// last instructions that were derived successfully.
    ProceedStale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    /// Base instructions.  Recalled facts are appended to a copy of this text
    /// on every turn; the configured value itself is never modified.
    pub instructions: String,
    /// Display name recorded as `user_name` metadata on incoming messages.
    pub user_name: String,
    pub human_input_mode: HumanInputMode,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Mnemo".to_string(),
            instructions: "You are a helpful assistant with long-term memory.".to_string(),
            user_name: "User".to_string(),
            human_input_mode: HumanInputMode::Always,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the memory service.  Overridden at load time by the
    /// `MNEMO_STORE_URL` environment variable when set.
    pub base_url: String,
    /// API key sent as `Authorization: Api-Key <key>`.  `MNEMO_API_KEY`
    /// takes precedence over the file value.
    pub api_key: String,
    pub timeout_secs: u64,
    /// Thread used by the CLI when `--thread` is not given.
    pub thread_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
            thread_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Minimum fact confidence forwarded with every context query.  The store
    /// decides what to do with it.
    pub min_fact_rating: f32,
    pub failure_policy: MemoryFailurePolicy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min_fact_rating: 0.0,
            failure_policy: MemoryFailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub store: StoreConfig,
    pub memory: MemoryConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)
                .with_context(|| format!("parse config {}", path.display()))?;
        }

        if let Ok(value) = env::var("MNEMO_STORE_URL") {
            if !value.is_empty() {
                config.store.base_url = value;
            }
        }

        // API key env override (takes precedence over config file).
        if let Ok(key) = env::var("MNEMO_API_KEY") {
            if !key.is_empty() {
                config.store.api_key = key;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    /// The API key, or `None` when none is configured.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.store.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
