use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use athena::{Engine, EngineConfig, ToolRegistry};

/// ATHENA text console: type a request, answer follow-up questions.
#[derive(Debug, Parser)]
#[command(name = "athena", version, about)]
struct Args {
    /// Intent -> tool module manifest.
    #[arg(long, default_value = "config/tools.json")]
    manifest: PathBuf,

    /// Engine config (JSON). Built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum match confidence, overrides the config file.
    #[arg(long)]
    threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1. Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    // 2. Config
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.match_threshold = threshold;
        config.validate()?;
    }

    // 3. Registry + Engine
    let registry = ToolRegistry::from_path(&args.manifest, &athena::tools::builtin_catalog());
    let mut engine = Engine::new(registry, config);
    tracing::info!(
        tools = engine.registry().len(),
        commands = engine.registry().command_count(),
        "ATHENA ready"
    );

    // 4. Console loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Text control activated. Type something to start ('quit' to exit).\n")
        .await?;

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else { break };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        let (text, continues) = engine.process(input).await.into_parts();
        stdout.write_all(format!("ATHENA: {}\n", text).as_bytes()).await?;
        if !continues {
            tracing::debug!(turn = engine.turn.index, "Command completed");
        }
    }

    let snap = engine.telemetry.snapshot();
    tracing::info!(
        dispatched = snap.dispatch_stats.total(),
        failed = snap.dispatch_stats.failed + snap.dispatch_stats.panicked + snap.dispatch_stats.timed_out,
        sessions = snap.session_stats.opened,
        abandoned = snap.session_stats.abandoned,
        clarifications = snap.clarification_stats.total(),
        "Session summary"
    );
    Ok(())
}
