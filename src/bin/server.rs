use anyhow::Context;
use clap::Parser;
use readmeservice::{create_app, logging, AppState, Config, ReadmeGenerator, VisitorLedger};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "HTTP server for README generation and visitor counting")]
struct Args {
    /// Config file (defaults to <config dir>/readmeservice/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init(config.log_level_or(args.log_level.as_deref()))?;

    let generator = ReadmeGenerator::from_config(&config)?;
    let ledger = Arc::new(VisitorLedger::new(config.server.visitors_file.clone()));
    let state = AppState::new(generator, ledger);

    info!("readmeservice server starting...");
    info!("GitHub API: {}", config.github.api_base);
    info!("Model: {} via {}", config.generation.model, config.generation.api_base);
    info!("Visitor file: {}", config.server.visitors_file.display());

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!("Server listening on http://{}", config.server.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
