//! Error types shared by the analysis core, the price source and the service layer

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised by the numerical pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Invalid smoothing periods or an unrecognized bucket rule.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required field is absent from an input bar.
    #[error("Missing field `{field}` in bar {index}")]
    MissingField { field: &'static str, index: usize },
}

/// Errors surfaced by a [`PriceSource`](crate::source::PriceSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, timeout or an undecodable body.
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The upstream API has no price history for the symbol.
    #[error("No price history for symbol {0}")]
    UnknownSymbol(String),

    /// An upstream record could not be turned into a price bar.
    #[error("Malformed price record: {0}")]
    Record(#[from] AnalysisError),
}

/// Errors returned by the use cases in [`service`](crate::service).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Price data unavailable: {0}")]
    DataUnavailable(#[from] SourceError),
}

impl ServiceError {
    /// HTTP status the boundary layer reports for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Analysis(AnalysisError::Configuration(_)) => StatusCode::BAD_REQUEST,
            Self::Analysis(AnalysisError::MissingField { .. }) => StatusCode::BAD_GATEWAY,
            Self::DataUnavailable(SourceError::Record(_)) => StatusCode::BAD_GATEWAY,
            Self::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
