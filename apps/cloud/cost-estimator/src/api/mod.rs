pub mod estimate;
pub mod health;

use crate::openapi::ApiDoc;
use crate::state::AppState;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use axum_helpers::errors::handlers::not_found;
use axum_helpers::middleware::security::security_headers;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable as RedocServable};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full router. Deliberately does not reuse
/// `axum_helpers::server::create_router`: that helper hardcodes `/health` to
/// the generic always-200 handler, but this service's `/health` has to
/// reflect whether the database is actually reachable, so the doc merging
/// and middleware it would have applied are reassembled here by hand instead.
pub fn routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/v1/estimate", post(estimate::estimate_json))
        .route("/v1/estimate/terraform", post(estimate::estimate_multipart))
        .with_state(state.clone());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health::health_handler))
        .with_state(state.clone())
        .nest("/api", api)
        .route("/metrics", get(observability::metrics_handler))
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(observability::middleware::metrics_middleware))
        .layer(middleware::from_fn(security_headers))
}
