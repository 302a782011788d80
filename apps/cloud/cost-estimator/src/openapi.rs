//! OpenAPI documentation configuration

use crate::api::estimate;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(estimate::estimate_json, estimate::estimate_multipart),
    components(schemas(
        estimate::EstimateRequest,
        estimate::EstimateResponse,
        domain_estimate::CostEstimate,
        domain_estimate::ResourceCost,
        domain_estimate::ServiceCost,
        domain_estimate::EstimateMetadata,
        domain_estimate::PricedItem,
        domain_estimate::Confidence,
    )),
    info(
        title = "Cost Estimator API",
        version = "0.1.0",
        description = "Estimates monthly cloud spend for a Terraform configuration against the ingested pricing catalog",
        license(name = "MIT")
    ),
    servers((url = "/api", description = "API base path")),
    tags((name = "estimate", description = "Cost estimation endpoints"))
)]
pub struct ApiDoc;
