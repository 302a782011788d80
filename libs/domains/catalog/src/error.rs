use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error taxonomy for the warehouse store and ingestion pipeline.
///
/// `FetchTransient` and `DbTransient` are retried by their callers before
/// ever reaching this enum in its terminal form; a catalog miss during
/// price matching is deliberately **not** represented here — spec section
/// 7 treats it as data (an `Unknown`-confidence line item), never an error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("fetch failed permanently: {0}")]
    FetchPermanent(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("database error (non-retryable): {0}")]
    DbFatal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::FetchPermanent(_) => StatusCode::BAD_GATEWAY,
            CatalogError::Database(_) | CatalogError::DbFatal(_) | CatalogError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        tracing::error!(error = %self, "catalog error");
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
