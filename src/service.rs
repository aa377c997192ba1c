//! Use cases: oscillator minima and stop-loss levels for a symbol
//!
//! Fetches daily history from the injected [`PriceSource`], restores chronological
//! order, aggregates into buckets and runs the injected [`OscillatorEngine`].

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analysis::{
    aggregate, locate_stop_loss, minima_rows, OscillatorEngine, Period, PriceBar,
};
use crate::config::AnalysisParams;
use crate::error::{AnalysisError, ServiceError, SourceError};
use crate::source::PriceSource;
use crate::types::{finite, midnight, MacdMinimaRow, StopLossRow};

/// Symbols fetched at once by [`StopLossService::batch_stop_loss`]
const BATCH_CONCURRENCY: usize = 4;

/// Minima and stop-loss computed from one fetch of a symbol's history
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub minima: Vec<MacdMinimaRow>,
    pub stop_loss: StopLossRow,
}

pub struct StopLossService {
    source: Arc<dyn PriceSource>,
    engine: Arc<dyn OscillatorEngine>,
}

impl StopLossService {
    pub fn new(source: Arc<dyn PriceSource>, engine: Arc<dyn OscillatorEngine>) -> Self {
        Self { source, engine }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Daily bars for `symbol`, oldest first
    async fn history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>, ServiceError> {
        let mut bars = self.source.fetch(symbol, days).await?;
        if bars.is_empty() {
            return Err(SourceError::UnknownSymbol(symbol.to_string()).into());
        }
        bars.sort_by_key(|b| b.date);
        debug!("{}: {} daily bars", symbol, bars.len());
        Ok(bars)
    }

    /// Local minima of the oscillator over `params.period` buckets
    pub async fn macd_minima(
        &self,
        symbol: &str,
        params: &AnalysisParams,
    ) -> Result<Vec<MacdMinimaRow>, ServiceError> {
        let period: Period = params.period.parse()?;
        if params.window == 0 {
            return Err(
                AnalysisError::Configuration("window must be at least 1".to_string()).into(),
            );
        }

        info!("Minima for {} (period={}, window={})", symbol, period, params.window);
        let bars = self.history(symbol, params.days).await?;
        let rows =
            minima_for_history(symbol, &bars, &period, self.engine.as_ref(), params.window)?;
        info!("{}: {} minima", symbol, rows.len());
        Ok(rows)
    }

    /// Stop-loss level over `params.period` buckets
    pub async fn stop_loss(
        &self,
        symbol: &str,
        params: &AnalysisParams,
    ) -> Result<StopLossRow, ServiceError> {
        let period: Period = params.period.parse()?;

        info!(
            "Stop-loss for {} (period={}, num_elements={})",
            symbol, period, params.num_elements
        );
        let bars = self.history(symbol, params.days).await?;
        let row = stop_loss_for_history(
            symbol,
            &bars,
            &period,
            self.engine.as_ref(),
            params.num_elements,
        )?;
        info!("{}: stop loss {:?} on {:?}", symbol, row.stop_loss, row.stop_loss_date);
        Ok(row)
    }

    /// Minima and stop-loss from a single fetch
    pub async fn report(
        &self,
        symbol: &str,
        params: &AnalysisParams,
    ) -> Result<SymbolReport, ServiceError> {
        let period: Period = params.period.parse()?;
        if params.window == 0 {
            return Err(
                AnalysisError::Configuration("window must be at least 1".to_string()).into(),
            );
        }

        let bars = self.history(symbol, params.days).await?;
        let engine = self.engine.as_ref();
        let minima = minima_for_history(symbol, &bars, &period, engine, params.window)?;
        let stop_loss = stop_loss_for_history(symbol, &bars, &period, engine, params.num_elements)?;
        info!("{}: {} minima, stop loss {:?}", symbol, minima.len(), stop_loss.stop_loss);
        Ok(SymbolReport { minima, stop_loss })
    }

    /// Stop-loss for each symbol, fetched concurrently, in input order
    pub async fn batch_stop_loss(
        &self,
        symbols: &[String],
        params: &AnalysisParams,
    ) -> Vec<(String, Result<StopLossRow, ServiceError>)> {
        info!("Batch stop-loss for {} symbols", symbols.len());

        stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                let result = self.stop_loss(&symbol, params).await;
                if let Err(e) = &result {
                    warn!("{}: {}", symbol, e);
                }
                (symbol, result)
            })
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await
    }
}

/// Minima rows for ascending daily `bars`
pub fn minima_for_history(
    symbol: &str,
    bars: &[PriceBar],
    period: &Period,
    engine: &dyn OscillatorEngine,
    window: usize,
) -> Result<Vec<MacdMinimaRow>, AnalysisError> {
    let series = aggregate(bars, period)?;
    let oscillator = engine.compute(&series)?;

    let rows = minima_rows(&series, &oscillator, window)?
        .into_iter()
        .map(|m| MacdMinimaRow {
            symbol: symbol.to_string(),
            date: midnight(m.date),
            macd: finite(m.oscillator_value),
            price: finite(m.price),
            period: period.code().to_string(),
        })
        .collect();
    Ok(rows)
}

/// Stop-loss row for ascending daily `bars`
pub fn stop_loss_for_history(
    symbol: &str,
    bars: &[PriceBar],
    period: &Period,
    engine: &dyn OscillatorEngine,
    num_elements: usize,
) -> Result<StopLossRow, AnalysisError> {
    let series = aggregate(bars, period)?;
    let oscillator = engine.compute(&series)?;
    let level = locate_stop_loss(&series, &oscillator, num_elements)?;

    debug!(
        "{}: peak rank {}, trough rank {}, final rank {} of {}",
        symbol,
        level.peak_rank,
        level.trough_rank,
        level.final_rank,
        series.len()
    );

    Ok(StopLossRow {
        symbol: symbol.to_string(),
        current_price: bars.last().and_then(|b| finite(b.close)),
        stop_loss: level.stop_loss.and_then(finite),
        stop_loss_date: level.stop_loss_date.map(midnight),
        max_macd_date: level.max_oscillator_date.map(midnight),
        period: period.code().to_string(),
    })
}
