use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_helpers::health::run_health_checks;
use sea_orm::ConnectionTrait;
use serde_json::json;

/// `GET /health`: unlike the generic always-200 handler, this one actually
/// pings the database, since an estimate request is useless without a
/// catalog to price against. Returns 503 when the ping fails or times out.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let db = state.db.clone();
    let checks = vec![(
        "database",
        Box::pin(async move {
            tokio::time::timeout(std::time::Duration::from_secs(2), db.ping())
                .await
                .map_err(|_| "timed out".to_string())?
                .map_err(|e| e.to_string())
        }) as axum_helpers::health::HealthCheckFuture<'_>,
    )];

    match run_health_checks(checks).await {
        Ok((_, Json(body))) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "checks": body,
            })),
        )
            .into_response(),
        Err((_, Json(body))) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "version": env!("CARGO_PKG_VERSION"),
                "checks": body,
            })),
        )
            .into_response(),
    }
}
