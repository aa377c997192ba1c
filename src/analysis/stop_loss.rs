//! Confirmed-trough stop-loss locator
//!
//! Works on series addressed by 1-based rank (rank 1 = oldest bucket). Rank 0 is
//! reserved for an optional anchor value preceding the series and doubles as the
//! "nothing confirmed" result of a scan.

use chrono::NaiveDate;

use super::bars::AggregatedSeries;
use crate::error::AnalysisError;

/// Look-back cap for the oscillator stage of the scan
pub const OSCILLATOR_LOOKBACK: usize = 5;

/// Default look-back cap for the low-price stage
pub const DEFAULT_NUM_ELEMENTS: usize = 20;

/// Read-only view of values by 1-based rank
#[derive(Debug, Clone, Copy)]
pub struct RankedSeries<'a> {
    anchor: Option<f64>,
    values: &'a [f64],
}

impl<'a> RankedSeries<'a> {
    /// `values[0]` becomes rank 1
    pub fn new(values: &'a [f64]) -> Self {
        Self {
            anchor: None,
            values,
        }
    }

    /// Supplies the rank 0 value compared against by rank 1
    pub fn with_anchor(mut self, anchor: f64) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Number of ranked values, excluding the anchor
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `rank`; rank 0 is the anchor
    pub fn get(&self, rank: usize) -> Option<f64> {
        match rank {
            0 => self.anchor,
            r => self.values.get(r - 1).copied(),
        }
    }
}

/// Whether the value at `rank` is below each of the `min(rank, cap) - 1`
/// values preceding it. NaN predecessors are skipped.
///
/// Rank 1 only compares against the anchor and passes when there is none.
pub fn is_confirmed(series: &RankedSeries<'_>, rank: usize, cap: usize) -> bool {
    let Some(current) = series.get(rank).filter(|_| rank > 0) else {
        return false;
    };

    if rank == 1 {
        return match series.get(0) {
            Some(anchor) => current < anchor,
            None => true,
        };
    }

    (1..rank.min(cap)).all(|i| match series.get(rank - i) {
        Some(prior) if !prior.is_nan() => current < prior,
        _ => true,
    })
}

/// Walks from `start_rank` down to rank 1 and returns the first confirmed rank,
/// or 0 when none is.
pub fn scan_backward(series: &RankedSeries<'_>, start_rank: usize, cap: usize) -> usize {
    (1..=start_rank)
        .rev()
        .find(|&rank| is_confirmed(series, rank, cap))
        .unwrap_or(0)
}

/// Rank of the largest non-NaN value, the earliest one on ties
pub fn peak_rank(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if v <= top => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i + 1)
}

/// Outcome of the two-stage scan. A rank of 0 means nothing was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLossLevel {
    pub peak_rank: usize,
    pub trough_rank: usize,
    pub final_rank: usize,
    pub stop_loss: Option<f64>,
    pub stop_loss_date: Option<NaiveDate>,
    pub max_oscillator_date: Option<NaiveDate>,
}

/// Picks the stop-loss level for an aggregated series and its oscillator.
///
/// 1. Peak: rank of the oscillator maximum.
/// 2. Walk back from the peak to the first oscillator value below its
///    `OSCILLATOR_LOOKBACK - 1` predecessors.
/// 3. Walk back from there to the first low below its `num_elements - 1`
///    predecessors.
pub fn locate_stop_loss(
    series: &AggregatedSeries,
    oscillator: &[f64],
    num_elements: usize,
) -> Result<StopLossLevel, AnalysisError> {
    if oscillator.len() != series.len() {
        return Err(AnalysisError::Configuration(format!(
            "Oscillator has {} values for {} bars",
            oscillator.len(),
            series.len()
        )));
    }

    let lows = series.lows();
    let peak_rank = peak_rank(oscillator).unwrap_or(0);
    let trough_rank = scan_backward(&RankedSeries::new(oscillator), peak_rank, OSCILLATOR_LOOKBACK);
    let final_rank = scan_backward(&RankedSeries::new(&lows), trough_rank, num_elements);

    let stop_bar = series.at_rank(final_rank);
    Ok(StopLossLevel {
        peak_rank,
        trough_rank,
        final_rank,
        stop_loss: stop_bar.map(|b| b.low),
        stop_loss_date: stop_bar.map(|b| b.date),
        max_oscillator_date: series.at_rank(peak_rank).map(|b| b.date),
    })
}
