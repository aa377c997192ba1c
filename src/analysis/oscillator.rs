//! Momentum oscillators over aggregated closing prices

use super::bars::AggregatedSeries;
use crate::error::AnalysisError;

/// Default fast EMA span (MACD 12/26)
pub const DEFAULT_FAST_PERIOD: usize = 12;
/// Default slow EMA span
pub const DEFAULT_SLOW_PERIOD: usize = 26;

/// Computes one oscillator value per aggregated bar, rank-aligned with the input.
pub trait OscillatorEngine: Send + Sync {
    fn compute(&self, series: &AggregatedSeries) -> Result<Vec<f64>, AnalysisError>;

    /// Short label used in logs
    fn name(&self) -> &'static str;
}

/// Exponential moving average seeded from the first observation.
///
/// Smoothing factor is `2 / (period + 1)`. Leading NaNs stay NaN until the first
/// observation. An interior NaN carries the previous average forward while the
/// old average's weight keeps decaying, so the next observation counts for more.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut out = Vec::with_capacity(values.len());
    let mut avg = f64::NAN;
    let mut old_weight = 1.0;

    for &x in values {
        if avg.is_nan() {
            avg = x;
        } else {
            old_weight *= decay;
            if !x.is_nan() {
                if avg != x {
                    avg = (old_weight * avg + alpha * x) / (old_weight + alpha);
                }
                old_weight = 1.0;
            }
        }
        out.push(avg);
    }

    out
}

/// MACD line: fast EMA minus slow EMA of the close
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmaMacdCalculator {
    fast_period: usize,
    slow_period: usize,
}

impl EmaMacdCalculator {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, AnalysisError> {
        if fast_period == 0 || slow_period == 0 {
            return Err(AnalysisError::Configuration(
                "EMA periods must be positive integers".to_string(),
            ));
        }
        if fast_period >= slow_period {
            return Err(AnalysisError::Configuration(format!(
                "Fast period ({}) must be less than slow period ({})",
                fast_period, slow_period
            )));
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }
}

impl Default for EmaMacdCalculator {
    fn default() -> Self {
        Self {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
        }
    }
}

impl OscillatorEngine for EmaMacdCalculator {
    fn compute(&self, series: &AggregatedSeries) -> Result<Vec<f64>, AnalysisError> {
        let closes = series.closes();
        let fast = ema(&closes, self.fast_period);
        let slow = ema(&closes, self.slow_period);
        Ok(fast.iter().zip(&slow).map(|(f, s)| f - s).collect())
    }

    fn name(&self) -> &'static str {
        "ema-macd"
    }
}

/// Uses the close itself as the oscillator
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosePassthrough;

impl OscillatorEngine for ClosePassthrough {
    fn compute(&self, series: &AggregatedSeries) -> Result<Vec<f64>, AnalysisError> {
        Ok(series.closes())
    }

    fn name(&self) -> &'static str {
        "close"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::bars::PriceBar;
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> AggregatedSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 5).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(start + Duration::weeks(i as i64), c, c, c, c, 0.0))
            .collect::<Vec<_>>()
            .into()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{} != {}", a, b);
    }

    #[test]
    fn test_rejects_bad_periods() {
        assert!(matches!(
            EmaMacdCalculator::new(0, 26),
            Err(AnalysisError::Configuration(_))
        ));
        assert!(matches!(
            EmaMacdCalculator::new(26, 26),
            Err(AnalysisError::Configuration(_))
        ));
        assert!(matches!(
            EmaMacdCalculator::new(30, 26),
            Err(AnalysisError::Configuration(_))
        ));
        assert!(EmaMacdCalculator::new(3, 6).is_ok());
    }

    #[test]
    fn test_ema_recurrence() {
        // period 3 -> alpha 0.5
        let out = ema(&[2.0, 4.0, 8.0], 3);
        assert_close(out[0], 2.0);
        assert_close(out[1], 3.0);
        assert_close(out[2], 5.5);
    }

    #[test]
    fn test_ema_skips_missing_values() {
        let out = ema(&[f64::NAN, 2.0, f64::NAN, 8.0], 3);
        assert!(out[0].is_nan());
        assert_close(out[1], 2.0);
        // Carried forward through the gap
        assert_close(out[2], 2.0);
        // Old weight decayed twice: (0.25 * 2 + 0.5 * 8) / 0.75
        assert_close(out[3], 6.0);
    }

    #[test]
    fn test_output_is_rank_aligned() {
        let engine = EmaMacdCalculator::default();
        for n in [0, 1, 2, 30, 100] {
            let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64).sin()).collect();
            assert_eq!(engine.compute(&series(&closes)).unwrap().len(), n);
        }
    }

    #[test]
    fn test_macd_starts_at_zero_and_tracks_trend() {
        let engine = EmaMacdCalculator::new(2, 4).unwrap();
        let macd = engine.compute(&series(&[10.0, 11.0, 12.0, 13.0])).unwrap();
        assert_close(macd[0], 0.0);
        // Fast EMA reacts quicker in an uptrend
        assert!(macd[1] > 0.0 && macd[3] > macd[1]);
    }

    #[test]
    fn test_close_passthrough() {
        let out = ClosePassthrough.compute(&series(&[5.0, 4.0, 3.0])).unwrap();
        assert_eq!(out, vec![5.0, 4.0, 3.0]);
    }
}
