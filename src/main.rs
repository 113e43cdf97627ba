//! Conductor CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use conductor::cli::{ChatArgs, Cli, Commands, ReplInput};
use conductor::config::ConductorConfig;
use conductor::graph::EchoGraph;
use conductor::invoker::AgentGraphInvoker;
use conductor::session::ChatSession;
use conductor::sink::WriterSurface;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match ConductorConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Chat(args) => handle_chat(config, args).await,
            Commands::Config(args) => handle_config(config, args),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn handle_config(
    mut config: ConductorConfig,
    args: conductor::cli::SettingsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    args.apply(&mut config)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

async fn handle_chat(
    mut config: ConductorConfig,
    args: ChatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    args.settings.apply(&mut config)?;
    let graph = Arc::new(EchoGraph::new().with_prefix(args.prefix));
    let invoker =
        AgentGraphInvoker::from_config(graph, Arc::new(WriterSurface::stdout()), &config);
    let mut session = ChatSession::new(invoker);

    if let Some(prompt) = args.prompt {
        let outcome = session.submit(&prompt).await?;
        println!("\n{}", outcome.text());
        return Ok(());
    }

    eprintln!(
        "{} / {} (recursion limit {}). /clear resets, /quit exits.",
        config.settings.provider, config.settings.model, config.recursion_limit
    );
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match ReplInput::parse(&line) {
            ReplInput::Quit => break,
            ReplInput::Blank => continue,
            ReplInput::Clear => {
                session.clear();
                eprintln!("(conversation cleared)");
            }
            ReplInput::Query(query) => {
                let outcome = session.submit(&query).await?;
                println!("\n{}", outcome.text());
            }
        }
    }
    Ok(())
}
