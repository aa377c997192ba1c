use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::service::StopLossService;

/// One oscillator minimum as returned by `/stocks/{symbol}/macd-minima`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdMinimaRow {
    pub symbol: String,
    pub date: NaiveDateTime,
    pub macd: Option<f64>,
    pub price: Option<f64>,
    pub period: String,
}

/// Stop-loss level for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLossRow {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub stop_loss_date: Option<NaiveDateTime>,
    pub max_macd_date: Option<NaiveDateTime>,
    pub period: String,
}

/// `None` for NaN and infinities so they serialize as `null`
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Bucket dates are reported at midnight
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

pub struct AppState {
    pub service: StopLossService,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finite() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
        assert_eq!(finite(f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_minima_row_json() {
        let row = MacdMinimaRow {
            symbol: "FB".to_string(),
            date: midnight(NaiveDate::from_ymd_opt(2020, 1, 19).unwrap()),
            macd: finite(f64::NAN),
            price: finite(210.5),
            period: "W".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({
                "symbol": "FB",
                "date": "2020-01-19T00:00:00",
                "macd": null,
                "price": 210.5,
                "period": "W"
            })
        );
    }

    #[test]
    fn test_stop_loss_row_json() {
        let row = StopLossRow {
            symbol: "FB".to_string(),
            current_price: Some(200.0),
            stop_loss: finite(f64::INFINITY),
            stop_loss_date: None,
            max_macd_date: Some(midnight(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap())),
            period: "W".to_string(),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["current_price"], json!(200.0));
        assert_eq!(value["stop_loss"], json!(null));
        assert_eq!(value["stop_loss_date"], json!(null));
        assert_eq!(value["max_macd_date"], json!("2020-03-01T00:00:00"));
    }
}
