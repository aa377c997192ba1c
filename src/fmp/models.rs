//! Financial Modeling Prep response types

use chrono::NaiveDate;
use serde::Deserialize;

use crate::analysis::PriceBar;
use crate::error::AnalysisError;

/// Body of `GET /api/v3/historical-price-full/{symbol}`
///
/// Unknown symbols come back as `{}`; invalid keys as `{"Error Message": ...}`.
#[derive(Debug, Deserialize)]
pub struct HistoricalPriceResponse {
    #[serde(default)]
    pub symbol: Option<String>,

    #[serde(default)]
    pub historical: Option<Vec<HistoricalBar>>,

    #[serde(rename = "Error Message", default)]
    pub error_message: Option<String>,
}

/// One daily record, most recent first in the response
#[derive(Debug, Deserialize)]
pub struct HistoricalBar {
    pub date: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl HistoricalBar {
    /// Converts the record at `index` of the response.
    ///
    /// `date`, `low` and `close` are required; other absent values become NaN.
    pub fn into_price_bar(self, index: usize) -> Result<PriceBar, AnalysisError> {
        let date = self
            .date
            .as_deref()
            .and_then(parse_date)
            .ok_or(AnalysisError::MissingField { field: "date", index })?;
        let low = self.low.ok_or(AnalysisError::MissingField { field: "low", index })?;
        let close = self
            .close
            .ok_or(AnalysisError::MissingField { field: "close", index })?;

        Ok(PriceBar::new(
            date,
            self.open.unwrap_or(f64::NAN),
            self.high.unwrap_or(f64::NAN),
            low,
            close,
            self.volume.unwrap_or(f64::NAN),
        ))
    }
}

/// Accepts `2020-01-02` and `2020-01-02 16:00:00`
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "symbol": "FB",
            "historical": [
                {"date": "2020-01-02", "open": 10.0, "high": 11.0, "low": 9.0, "close": 10.5,
                 "adjClose": 10.5, "volume": 1000, "changePercent": 1.2, "label": "January 02, 20"},
                {"date": "2020-01-01", "open": 9.0, "high": 10.0, "low": 8.0, "close": 9.5, "volume": 900}
            ]
        }"#;
        let response: HistoricalPriceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.symbol.as_deref(), Some("FB"));

        let bars: Vec<PriceBar> = response
            .historical
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, b)| b.into_price_bar(i).unwrap())
            .collect();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[1].volume, 900.0);
    }

    #[test]
    fn test_unknown_symbol_body() {
        let response: HistoricalPriceResponse = serde_json::from_str("{}").unwrap();
        assert!(response.historical.is_none());
        assert!(response.error_message.is_none());
    }

    #[test]
    fn test_error_message_body() {
        let json = r#"{"Error Message": "Invalid API KEY."}"#;
        let response: HistoricalPriceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.error_message.as_deref(), Some("Invalid API KEY."));
    }

    #[test]
    fn test_missing_required_fields() {
        let bar: HistoricalBar =
            serde_json::from_str(r#"{"date": "2020-01-02", "low": 1.0}"#).unwrap();
        let err = bar.into_price_bar(4).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingField { field: "close", index: 4 }));

        let bar: HistoricalBar = serde_json::from_str(r#"{"close": 1.0, "low": 1.0}"#).unwrap();
        assert!(matches!(
            bar.into_price_bar(0),
            Err(AnalysisError::MissingField { field: "date", .. })
        ));
    }

    #[test]
    fn test_optional_fields_become_nan() {
        let bar: HistoricalBar = serde_json::from_str(
            r#"{"date": "2020-01-02 16:00:00", "low": 1.0, "close": 2.0}"#,
        )
        .unwrap();
        let bar = bar.into_price_bar(0).unwrap();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert!(bar.open.is_nan() && bar.high.is_nan() && bar.volume.is_nan());
    }
}
