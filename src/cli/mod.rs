//! CLI entry point for conductor.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConductorConfig;
use crate::error::{ConductorError, Result};
use crate::graph::RecursionBudget;
use crate::types::ModelProvider;

/// Conductor CLI
#[derive(Parser, Debug)]
#[command(name = "conductor", version, about = "Conductor: multi-agent chat turn loop")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat against the echo graph
    Chat(ChatArgs),
    /// Print the resolved configuration
    Config(SettingsArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Text placed before every echoed reply
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Run a single turn with this prompt instead of the interactive loop
    pub prompt: Option<String>,
}

/// Flags layered over the loaded configuration.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Model provider (openai, azure_openai, groq)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Maximum agent hops per turn
    #[arg(short, long)]
    pub recursion_limit: Option<u32>,

    /// Per-turn deadline in milliseconds
    #[arg(long)]
    pub turn_timeout_ms: Option<u64>,
}

impl SettingsArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut ConductorConfig) -> Result<()> {
        let provider = self
            .provider
            .as_deref()
            .map(|raw| {
                raw.parse::<ModelProvider>()
                    .map_err(|_| ConductorError::Configuration(format!("unknown provider: {raw}")))
            })
            .transpose()?;
        config.overlay_settings(provider, self.model.clone(), self.temperature);
        if let Some(limit) = self.recursion_limit {
            config.recursion_limit = RecursionBudget::new(limit)?;
        }
        if self.turn_timeout_ms.is_some() {
            config.turn_timeout_ms = self.turn_timeout_ms;
        }
        config.validate()
    }
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Quit,
    Clear,
    Query(String),
    Blank,
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Blank,
            "/quit" | "/exit" => Self::Quit,
            "/clear" => Self::Clear,
            query => Self::Query(query.to_string()),
        }
    }
}
