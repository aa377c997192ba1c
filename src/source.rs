//! Price data source abstraction
//!
//! A [`PriceSource`] returns the daily bars of a symbol, most recent first, the
//! way upstream historical-price APIs deliver them. Implementations are handed to
//! [`StopLossService`](crate::service::StopLossService) at construction.

use async_trait::async_trait;

use crate::analysis::PriceBar;
use crate::error::SourceError;

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Up to `days` daily bars for `symbol`, most recent first.
    async fn fetch(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>, SourceError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;

    /// In-memory source serving fixed bars per symbol
    #[derive(Default)]
    pub struct StaticSource {
        bars: HashMap<String, Vec<PriceBar>>,
    }

    impl StaticSource {
        /// Registers bars given oldest first; they are served most recent first.
        pub fn with(mut self, symbol: &str, mut ascending: Vec<PriceBar>) -> Self {
            ascending.reverse();
            self.bars.insert(symbol.to_string(), ascending);
            self
        }
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        async fn fetch(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>, SourceError> {
            let bars = self
                .bars
                .get(symbol)
                .ok_or_else(|| SourceError::UnknownSymbol(symbol.to_string()))?;
            Ok(bars.iter().take(days as usize).copied().collect())
        }
    }

    /// Bars spaced `step` apart with open = close = value, high = value + 1,
    /// low = max(value - 1, 0) and volume 1000
    pub fn bars_from_closes(start: NaiveDate, step: Duration, closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PriceBar::new(
                    start + step * i as i32,
                    c,
                    c + 1.0,
                    (c - 1.0).max(0.0),
                    c,
                    1000.0,
                )
            })
            .collect()
    }
}
