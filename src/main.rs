use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use stop_loss_calculator::api;
use stop_loss_calculator::config::{EngineArgs, FmpConfig, SourceArgs};
use stop_loss_calculator::fmp::FmpClient;
use stop_loss_calculator::{AppState, StopLossService};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// Address to bind the web server to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to run the web server on
    #[arg(short, long, default_value = "8000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stop_loss_calculator=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Starting stop-loss calculator server");
    info!("Price source: {}", args.source.base_url);
    info!("Oscillator: {:?}", args.engine.oscillator);

    let engine = args.engine.build().context("Invalid oscillator settings")?;
    let client = FmpClient::new(FmpConfig::from(args.source)).context("Failed to create FMP client")?;

    let state = Arc::new(AppState {
        service: StopLossService::new(Arc::new(client), engine),
    });

    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.host, args.port))?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
