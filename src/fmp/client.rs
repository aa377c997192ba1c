//! Financial Modeling Prep API Client
//!
//! HTTP client for the FMP historical daily price endpoint.

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::models::HistoricalPriceResponse;
use crate::analysis::PriceBar;
use crate::config::FmpConfig;
use crate::error::SourceError;
use crate::source::PriceSource;

/// FMP price source
pub struct FmpClient {
    client: Client,
    config: FmpConfig,
}

impl FmpClient {
    /// Create a new client; the API key must be non-empty
    pub fn new(config: FmpConfig) -> Result<Self> {
        ensure!(
            !config.api_key.trim().is_empty(),
            "FINANCIALMODELINGPREP_API_KEY is not set"
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn historical_url(&self, symbol: &str) -> String {
        format!(
            "{}/api/v3/historical-price-full/{}",
            self.config.base_url.trim_end_matches('/'),
            symbol
        )
    }
}

/// Turns a decoded response into bars, most recent first
pub(crate) fn bars_from_response(
    symbol: &str,
    response: HistoricalPriceResponse,
) -> Result<Vec<PriceBar>, SourceError> {
    if let Some(message) = response.error_message {
        return Err(SourceError::Api {
            status: 200,
            message,
        });
    }

    let records = response
        .historical
        .filter(|records| !records.is_empty())
        .ok_or_else(|| SourceError::UnknownSymbol(symbol.to_string()))?;

    let bars = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| record.into_price_bar(i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(bars)
}

#[async_trait]
impl PriceSource for FmpClient {
    async fn fetch(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>, SourceError> {
        debug!("Fetching {} days of prices for {}", days, symbol);

        let response = self
            .client
            .get(self.historical_url(symbol))
            .query(&[
                ("timeseries", days.to_string()),
                ("apikey", self.config.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Price request for {} failed ({}): {}", symbol, status, message);
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: HistoricalPriceResponse = response.json().await?;
        let bars = bars_from_response(symbol, body)?;
        debug!("Fetched {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    fn parse(json: &str) -> HistoricalPriceResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_rejects_empty_api_key() {
        assert!(FmpClient::new(FmpConfig::new("")).is_err());
        assert!(FmpClient::new(FmpConfig::new("  ")).is_err());
        assert!(FmpClient::new(FmpConfig::new("dummy")).is_ok());
    }

    #[test]
    fn test_historical_url() {
        let mut config = FmpConfig::new("dummy");
        config.base_url = "http://localhost:9000/".to_string();
        let client = FmpClient::new(config).unwrap();
        assert_eq!(
            client.historical_url("AAPL"),
            "http://localhost:9000/api/v3/historical-price-full/AAPL"
        );
    }

    #[test]
    fn test_bars_from_response() {
        let body = parse(
            r#"{"symbol": "FB", "historical": [
                {"date": "2020-01-02", "open": 10.0, "high": 11.0, "low": 9.0, "close": 10.5, "volume": 1000},
                {"date": "2020-01-01", "open": 9.0, "high": 10.0, "low": 8.0, "close": 9.5, "volume": 900}
            ]}"#,
        );
        let bars = bars_from_response("FB", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].date > bars[1].date);
    }

    #[test]
    fn test_unknown_symbol() {
        let err = bars_from_response("NOPE", parse("{}")).unwrap_err();
        assert!(matches!(err, SourceError::UnknownSymbol(s) if s == "NOPE"));

        let err = bars_from_response("NOPE", parse(r#"{"historical": []}"#)).unwrap_err();
        assert!(matches!(err, SourceError::UnknownSymbol(_)));
    }

    #[test]
    fn test_error_message_is_api_error() {
        let err = bars_from_response("FB", parse(r#"{"Error Message": "Invalid API KEY."}"#))
            .unwrap_err();
        assert!(matches!(err, SourceError::Api { message, .. } if message == "Invalid API KEY."));
    }

    #[test]
    fn test_malformed_record() {
        let body = parse(r#"{"historical": [{"date": "2020-01-02", "close": 1.0}]}"#);
        let err = bars_from_response("FB", body).unwrap_err();
        assert!(matches!(
            err,
            SourceError::Record(AnalysisError::MissingField { field: "low", index: 0 })
        ));
    }
}
