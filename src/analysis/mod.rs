//! Analysis Core - pure computations shared by the web server and the QA batch
//!
//! This module contains the numerical pipeline:
//! - Calendar bucket rules and bar aggregation
//! - EMA-based momentum oscillator
//! - Local minima detection
//! - Confirmed-trough stop-loss location

pub mod bars;
pub mod minima;
pub mod oscillator;
pub mod period;
pub mod stop_loss;

// Re-export commonly used types
pub use bars::{aggregate, AggregatedSeries, PriceBar};
pub use minima::{find_local_minima, minima_rows, MinimaRow};
pub use oscillator::{ema, ClosePassthrough, EmaMacdCalculator, OscillatorEngine};
pub use period::{Period, PeriodUnit};
pub use stop_loss::{
    is_confirmed, locate_stop_loss, peak_rank, scan_backward, RankedSeries, StopLossLevel,
    DEFAULT_NUM_ELEMENTS, OSCILLATOR_LOOKBACK,
};
