use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

use ecdl_client::protocol::HttpCoordinator;
use ecdl_client::session::Session;
use ecdl_client::{bench, engine, ClientConfig};

/// Client for distributed ECDLP computation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Problem id to work on
    id: Option<String>,

    /// Run a local benchmark and exit without contacting the server
    #[arg(short = 'b', long)]
    benchmark: bool,

    /// Path to the configuration file
    #[arg(long, default_value = "settings.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first - malformed settings are fatal
    let config = ClientConfig::load(&args.config).map_err(|e| {
        eprintln!("Error loading settings: {e:#}");
        e
    })?;

    init_logging(&config)?;

    // A backend with no usable device is a fatal startup error
    engine::preflight(&config.compute).context("Compute backend unavailable")?;
    info!("Using {} backend", config.compute.backend);

    if args.benchmark {
        return bench::run_benchmark(&config).await;
    }

    let Some(id) = args.id else {
        // Missing problem id: print usage and exit successfully, no work done
        Args::command().print_help()?;
        println!();
        return Ok(());
    };

    let coordinator =
        Arc::new(HttpCoordinator::new(&config).context("Failed to create server connection")?);
    info!("Coordination server: {}", config.server_url());

    let session = Session::new(id, config, coordinator);
    session.run().await?;

    Ok(())
}

fn init_logging(config: &ClientConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
