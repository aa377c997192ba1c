//! Daily price bars and their aggregation into calendar buckets

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::period::Period;
use crate::error::AnalysisError;

/// One OHLCV bar. A missing price or volume is stored as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Bars aggregated per calendar bucket, oldest first.
///
/// Bars are addressed by 1-based rank: rank 1 is the oldest bucket,
/// rank `len()` the most recent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedSeries {
    bars: Vec<PriceBar>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Bar at a 1-based rank
    pub fn at_rank(&self, rank: usize) -> Option<&PriceBar> {
        rank.checked_sub(1).and_then(|i| self.bars.get(i))
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }
}

impl From<Vec<PriceBar>> for AggregatedSeries {
    /// Wraps bars that are already one per bucket, oldest first.
    fn from(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }
}

/// Running OHLCV totals for the bucket being filled
struct Bucket {
    group: i64,
    bar: PriceBar,
}

impl Bucket {
    fn open(group: i64, key: NaiveDate, first: &PriceBar) -> Self {
        let mut bucket = Self {
            group,
            bar: PriceBar::new(key, f64::NAN, f64::NAN, f64::NAN, f64::NAN, 0.0),
        };
        bucket.add(first);
        bucket
    }

    fn add(&mut self, bar: &PriceBar) {
        let acc = &mut self.bar;
        if acc.open.is_nan() {
            acc.open = bar.open;
        }
        // f64::max/min ignore a NaN operand
        acc.high = acc.high.max(bar.high);
        acc.low = acc.low.min(bar.low);
        if !bar.close.is_nan() {
            acc.close = bar.close;
        }
        if !bar.volume.is_nan() {
            acc.volume += bar.volume;
        }
    }
}

/// Aggregate ascending daily bars into one bar per populated bucket of `period`.
///
/// Empty buckets produce no bar. Input must be sorted by date, oldest first.
pub fn aggregate(bars: &[PriceBar], period: &Period) -> Result<AggregatedSeries, AnalysisError> {
    let Some(first) = bars.first() else {
        return Ok(AggregatedSeries::default());
    };

    let origin = period.base_index(first.date);
    let mut out = Vec::new();
    let mut current: Option<Bucket> = None;

    for bar in bars {
        let group = period.group_of(period.base_index(bar.date), origin);

        if let Some(bucket) = current.as_mut().filter(|b| b.group == group) {
            bucket.add(bar);
            continue;
        }

        let key = period.group_key(group, origin).ok_or_else(|| {
            AnalysisError::Configuration(format!(
                "Period '{}' has no calendar bucket for {}",
                period, bar.date
            ))
        })?;
        if let Some(done) = current.replace(Bucket::open(group, key, bar)) {
            out.push(done.bar);
        }
    }

    if let Some(done) = current {
        out.push(done.bar);
    }

    Ok(AggregatedSeries { bars: out })
}
