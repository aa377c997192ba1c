//! Financial Modeling Prep Integration
//!
//! Daily price history for US equities from the FMP REST API.
//!
//! # Components
//!
//! - [`client`] - HTTP client implementing [`PriceSource`](crate::source::PriceSource)
//! - [`models`] - Response data types
//!
//! # Environment Variables
//!
//! - `FINANCIALMODELINGPREP_API_KEY` - Your FMP API key
//! - `FMP_BASE_URL` (optional) - API root, defaults to `https://financialmodelingprep.com`
//!
//! # API Endpoints Used
//!
//! - `GET /api/v3/historical-price-full/{symbol}?timeseries={days}` - Daily bars, newest first

pub mod client;
pub mod models;

// Re-export commonly used types
pub use client::FmpClient;
pub use models::{HistoricalBar, HistoricalPriceResponse};
