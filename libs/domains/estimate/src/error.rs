use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use thiserror::Error;

pub type EstimateResult<T> = Result<T, EstimateError>;

/// Error taxonomy for the translate/match/aggregate pipeline. A catalog
/// miss during price matching is **not** one of these — it is encoded as
/// an `Unknown`-confidence `PricedItem` with `pricing_source = "NOT_FOUND"`
/// and surfaces as a warning, never as an error.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration could not be parsed: {0}")]
    ConfigParseError(String),

    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] domain_catalog::CatalogError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for EstimateError {
    fn into_response(self) -> Response {
        let status = match &self {
            EstimateError::InvalidInput(_) | EstimateError::ConfigParseError(_) => StatusCode::BAD_REQUEST,
            EstimateError::Catalog(_) | EstimateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self, "estimate error");
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
