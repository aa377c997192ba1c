use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::analysis::Period;
use crate::config::AnalysisParams;
use crate::error::{AnalysisError, ServiceError};
use crate::types::{AppState, MacdMinimaRow, StopLossRow};

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

/// `Query` that rejects malformed parameters with a JSON `{"error": ...}` body
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err((
                rejection.status(),
                Json(serde_json::json!({"error": rejection.body_text()})),
            )
                .into_response()),
        }
    }
}

/// Query params for the batch endpoint
#[derive(Debug, Deserialize)]
pub struct BatchQueryParams {
    /// Comma-separated symbols
    pub symbols: String,
    pub period: Option<String>,
    pub days: Option<u32>,
    #[serde(alias = "numElements")]
    pub num_elements: Option<usize>,
}

impl BatchQueryParams {
    fn symbol_list(&self) -> Vec<String> {
        self.symbols
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn analysis_params(&self) -> AnalysisParams {
        let defaults = AnalysisParams::default();
        AnalysisParams {
            period: self.period.clone().unwrap_or(defaults.period),
            days: self.days.unwrap_or(defaults.days),
            num_elements: self.num_elements.unwrap_or(defaults.num_elements),
            ..defaults
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stocks/{symbol}", get(get_stop_loss))
        .route("/stocks/{symbol}/macd-minima", get(get_macd_minima))
        .route("/stop-loss", get(get_batch_stop_loss))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// GET /stocks/{symbol} - Stop-loss level for one symbol
pub async fn get_stop_loss(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    ApiQuery(params): ApiQuery<AnalysisParams>,
) -> Result<Json<StopLossRow>, ServiceError> {
    let row = state.service.stop_loss(&symbol, &params).await?;
    Ok(Json(row))
}

/// GET /stocks/{symbol}/macd-minima - Oscillator minima for one symbol
pub async fn get_macd_minima(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    ApiQuery(params): ApiQuery<AnalysisParams>,
) -> Result<Json<Vec<MacdMinimaRow>>, ServiceError> {
    let rows = state.service.macd_minima(&symbol, &params).await?;
    Ok(Json(rows))
}

/// GET /stop-loss?symbols=A,B - Stop-loss rows for every symbol that succeeded
pub async fn get_batch_stop_loss(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<BatchQueryParams>,
) -> Result<Json<Vec<StopLossRow>>, ServiceError> {
    let symbols = query.symbol_list();
    if symbols.is_empty() {
        return Err(AnalysisError::Configuration("No symbols given".to_string()).into());
    }

    let params = query.analysis_params();
    params.period.parse::<Period>()?;

    let rows = state
        .service
        .batch_stop_loss(&symbols, &params)
        .await
        .into_iter()
        .filter_map(|(_, result)| result.ok())
        .collect();
    Ok(Json(rows))
}
