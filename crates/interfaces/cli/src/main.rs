mod memory_cmds;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mnemo_config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "mnemo",
    version,
    about = "Thread-memory hooks for a conversational agent"
)]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Persist a human message to a memory thread.
    Remember {
        #[arg(long)]
        thread: Option<String>,
        /// Display name recorded with the message (defaults to `agent.user_name`).
        #[arg(long = "as-name", value_name = "NAME")]
        as_name: Option<String>,
        text: String,
    },
    /// Emit an agent reply through the post-send hook, persisting it.
    Reply {
        #[arg(long)]
        thread: Option<String>,
        /// Parse TEXT as a JSON message (`"..."` or `{"content": ...}`).
        #[arg(long)]
        json: bool,
        text: String,
    },
    /// Print the fact context the store holds for a thread.
    Facts {
        #[arg(long)]
        thread: Option<String>,
    },
    /// Print the instructions the next turn would run with.
    Instructions {
        #[arg(long)]
        thread: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Remember {
            thread,
            as_name,
            text,
        } => {
            let thread = memory_cmds::resolve_thread(&config, thread)?;
            memory_cmds::run_remember(&config, thread, as_name.as_deref(), &text).await?;
        }
        Commands::Reply { thread, json, text } => {
            let thread = memory_cmds::resolve_thread(&config, thread)?;
            let message = memory_cmds::parse_reply(&text, json)?;
            memory_cmds::run_reply(&config, thread, message).await?;
        }
        Commands::Facts { thread } => {
            let thread = memory_cmds::resolve_thread(&config, thread)?;
            memory_cmds::run_facts(&config, thread).await?;
        }
        Commands::Instructions { thread } => {
            let thread = memory_cmds::resolve_thread(&config, thread)?;
            memory_cmds::run_instructions(&config, thread).await?;
        }
    }

    Ok(())
}
