//! Local minima detection over arbitrary numeric series

use chrono::NaiveDate;

use super::bars::AggregatedSeries;
use crate::error::AnalysisError;

/// Positions of interior local minima within `window` neighbors on each side.
///
/// - The first and last positions are never reported.
/// - A point qualifies when it is <= every non-NaN neighbor and strictly below
///   at least one of them. NaN points, and points whose neighbors are all NaN,
///   never qualify.
/// - For a plateau of equal qualifying points only the first position is kept.
pub fn find_local_minima(values: &[f64], window: usize) -> Vec<usize> {
    let n = values.len();
    if n < 3 {
        return Vec::new();
    }

    let mut minima: Vec<usize> = Vec::new();

    for i in 1..n - 1 {
        let center = values[i];
        if center.is_nan() {
            continue;
        }

        let start = i.saturating_sub(window);
        let end = i.saturating_add(window).min(n - 1);
        let mut neighbors = (start..=end)
            .filter(|&j| j != i)
            .map(|j| values[j])
            .filter(|v| !v.is_nan())
            .peekable();

        if neighbors.peek().is_none() {
            continue;
        }

        let mut strictly_below_some = false;
        let mut below_all = true;
        for v in neighbors {
            if center > v {
                below_all = false;
                break;
            }
            strictly_below_some |= center < v;
        }
        if !(below_all && strictly_below_some) {
            continue;
        }

        if let Some(&prev) = minima.last() {
            if i == prev + 1 && values[prev] == center {
                continue;
            }
        }
        minima.push(i);
    }

    minima
}

/// A local minimum of the oscillator mapped back to its bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimaRow {
    pub date: NaiveDate,
    pub oscillator_value: f64,
    /// Close of the bucket
    pub price: f64,
}

/// Minima of `oscillator` joined with the dates and closes of `series`, by date.
pub fn minima_rows(
    series: &AggregatedSeries,
    oscillator: &[f64],
    window: usize,
) -> Result<Vec<MinimaRow>, AnalysisError> {
    if oscillator.len() != series.len() {
        return Err(AnalysisError::Configuration(format!(
            "Oscillator has {} values for {} bars",
            oscillator.len(),
            series.len()
        )));
    }

    let mut rows: Vec<MinimaRow> = find_local_minima(oscillator, window)
        .into_iter()
        .map(|i| {
            let bar = &series.bars()[i];
            MinimaRow {
                date: bar.date,
                oscillator_value: oscillator[i],
                price: bar.close,
            }
        })
        .collect();

    rows.sort_by_key(|r| r.date);
    Ok(rows)
}
