//! Batch QA export: minima and stop-loss levels for a list of symbols as CSV
//!
//! Writes `<out-dir>/<SYMBOL>_macd_minima.csv` per symbol and a combined
//! `<out-dir>/stop_loss.csv`. Symbols that fail are logged and skipped.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use stop_loss_calculator::analysis::DEFAULT_NUM_ELEMENTS;
use stop_loss_calculator::config::{
    AnalysisParams, EngineArgs, FmpConfig, SourceArgs, DEFAULT_DAYS, DEFAULT_PERIOD,
    DEFAULT_WINDOW,
};
use stop_loss_calculator::fmp::FmpClient;
use stop_loss_calculator::StopLossService;

const DEFAULT_SYMBOLS: &str = "AAPL,MSFT,AMZN,GOOGL,META,TSLA,NVDA,JPM,BAC,NFLX";

#[derive(Parser, Debug)]
#[command(author, version, about = "Export minima and stop-loss levels as CSV")]
struct Args {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    engine: EngineArgs,

    /// Symbols to process (comma-separated)
    #[arg(short, long, default_value = DEFAULT_SYMBOLS)]
    symbols: String,

    /// Bucket rule
    #[arg(long, default_value = DEFAULT_PERIOD)]
    period: String,

    /// Minima neighborhood radius
    #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// History length in days
    #[arg(short, long, default_value_t = DEFAULT_DAYS)]
    days: u32,

    /// Look-back cap for the low-price stage
    #[arg(long, default_value_t = DEFAULT_NUM_ELEMENTS)]
    num_elements: usize,

    /// Output directory
    #[arg(short, long, default_value = "qa_output")]
    out_dir: PathBuf,
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stop_loss_calculator=info".parse()?)
                .add_directive("qa_batch=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let symbols: Vec<String> = args
        .symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    let params = AnalysisParams {
        period: args.period.clone(),
        window: args.window,
        days: args.days,
        num_elements: args.num_elements,
    };

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let engine = args.engine.build().context("Invalid oscillator settings")?;
    let client = FmpClient::new(FmpConfig::from(args.source)).context("Failed to create FMP client")?;
    let service = StopLossService::new(Arc::new(client), engine);

    info!(
        "Processing {} symbols (period={}, oscillator={})",
        symbols.len(),
        params.period,
        service.engine_name()
    );

    let mut stop_losses = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        match service.report(symbol, &params).await {
            Ok(report) => {
                let path = args.out_dir.join(format!("{}_macd_minima.csv", symbol));
                write_csv(&path, &report.minima)?;
                info!("{}: {} minima -> {}", symbol, report.minima.len(), path.display());
                stop_losses.push(report.stop_loss);
            }
            Err(e) => warn!("{}: skipping: {}", symbol, e),
        }
    }

    let path = args.out_dir.join("stop_loss.csv");
    write_csv(&path, &stop_losses)?;
    info!(
        "{} of {} stop-loss rows -> {}",
        stop_losses.len(),
        symbols.len(),
        path.display()
    );

    Ok(())
}
