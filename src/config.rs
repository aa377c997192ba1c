//! Configuration for the price source, the oscillator and per-request analysis

use clap::{Args, ValueEnum};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::oscillator::{DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD};
use crate::analysis::{ClosePassthrough, EmaMacdCalculator, OscillatorEngine, DEFAULT_NUM_ELEMENTS};
use crate::error::AnalysisError;

/// Default Financial Modeling Prep API root
pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com";

/// Default bucket rule (weeks ending Sunday)
pub const DEFAULT_PERIOD: &str = "W";
/// Default minima neighborhood radius
pub const DEFAULT_WINDOW: usize = 1;
/// Default history length in days (about ten years)
pub const DEFAULT_DAYS: u32 = 3650;

/// Connection settings for the Financial Modeling Prep API
#[derive(Debug, Clone)]
pub struct FmpConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl FmpConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_FMP_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Price source command line options
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Financial Modeling Prep API key
    #[arg(short, long, env = "FINANCIALMODELINGPREP_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Financial Modeling Prep API root
    #[arg(long, env = "FMP_BASE_URL", default_value = DEFAULT_FMP_BASE_URL)]
    pub base_url: String,

    /// HTTP timeout for price requests in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,
}

impl From<SourceArgs> for FmpConfig {
    fn from(args: SourceArgs) -> Self {
        Self {
            api_key: args.api_key,
            base_url: args.base_url,
            timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

/// Which oscillator feeds minima detection and the stop-loss scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OscillatorKind {
    /// Fast EMA minus slow EMA of the close
    Ema,
    /// The close itself
    Close,
}

/// Oscillator command line options
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Oscillator used for minima and stop-loss
    #[arg(long, value_enum, default_value = "ema")]
    pub oscillator: OscillatorKind,

    /// Fast EMA span
    #[arg(long, default_value_t = DEFAULT_FAST_PERIOD)]
    pub fast_period: usize,

    /// Slow EMA span
    #[arg(long, default_value_t = DEFAULT_SLOW_PERIOD)]
    pub slow_period: usize,
}

impl EngineArgs {
    pub fn build(&self) -> Result<Arc<dyn OscillatorEngine>, AnalysisError> {
        let engine: Arc<dyn OscillatorEngine> = match self.oscillator {
            OscillatorKind::Ema => {
                Arc::new(EmaMacdCalculator::new(self.fast_period, self.slow_period)?)
            }
            OscillatorKind::Close => Arc::new(ClosePassthrough),
        };
        Ok(engine)
    }
}

/// Per-request analysis parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Bucket rule, e.g. `W`, `MS`, `2W`
    pub period: String,
    /// Minima neighborhood radius
    pub window: usize,
    /// History length to fetch
    pub days: u32,
    /// Look-back cap for the low-price stage of the stop-loss scan
    #[serde(alias = "numElements")]
    pub num_elements: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD.to_string(),
            window: DEFAULT_WINDOW,
            days: DEFAULT_DAYS,
            num_elements: DEFAULT_NUM_ELEMENTS,
        }
    }
}
