use crate::hcl_loader;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use base64::Engine;
use domain_catalog::{PgWarehouseStore, WarehouseStore};
use domain_estimate::error::EstimateError;
use domain_estimate::{aggregate, apply_override, match_price, CostEstimate, MatcherRegistry};
use futures::future::try_join_all;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Deserialize, ToSchema)]
pub struct EstimateRequest {
    pub region: String,
    pub terraform_hcl: Option<String>,
    /// Base64-encoded zip of one or more `.tf` files.
    pub terraform_zip: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstimateResponse(#[schema(inline)] pub CostEstimate);

/// `POST /api/v1/estimate`: JSON body carrying either raw HCL text or a
/// base64-encoded zip, never both.
#[utoipa::path(
    post,
    path = "/api/v1/estimate",
    request_body = EstimateRequest,
    responses((status = 200, description = "Cost estimate", body = CostEstimate)),
    tag = "estimate",
)]
pub async fn estimate_json(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<CostEstimate>, EstimateError> {
    let input_bytes = match (&request.terraform_hcl, &request.terraform_zip) {
        (Some(hcl), None) => hcl.as_bytes().to_vec(),
        (None, Some(zip)) => zip.as_bytes().to_vec(),
        (Some(_), Some(_)) => {
            return Err(EstimateError::InvalidInput(
                "exactly one of terraform_hcl or terraform_zip must be set".to_string(),
            ))
        }
        (None, None) => {
            return Err(EstimateError::InvalidInput(
                "one of terraform_hcl or terraform_zip is required".to_string(),
            ))
        }
    };

    let config = match (&request.terraform_hcl, &request.terraform_zip) {
        (Some(hcl), _) => hcl_loader::parse_hcl(hcl).map_err(|e| EstimateError::ConfigParseError(e.to_string()))?,
        (_, Some(zip)) => {
            let dir = hcl_loader::extract_zip_base64(zip).map_err(|e| EstimateError::ConfigParseError(e.to_string()))?;
            hcl_loader::parse_hcl_dir(dir.path()).map_err(|e| EstimateError::ConfigParseError(e.to_string()))?
        }
        (None, None) => unreachable!(),
    };

    let estimate = run_estimate(&state, &config, &request.region, &input_bytes).await?;
    Ok(Json(estimate))
}

/// `POST /api/v1/estimate/terraform`: multipart upload, a `region` text
/// field plus a `terraform` file part (a zip or a single config file).
#[utoipa::path(
    post,
    path = "/api/v1/estimate/terraform",
    responses((status = 200, description = "Cost estimate", body = CostEstimate)),
    tag = "estimate",
)]
pub async fn estimate_multipart(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CostEstimate>, EstimateError> {
    let mut region: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| EstimateError::InvalidInput(e.to_string()))?
    {
        match field.name() {
            Some("region") => {
                region = Some(field.text().await.map_err(|e| EstimateError::InvalidInput(e.to_string()))?);
            }
            Some("terraform") => {
                file_name = field.file_name().map(|s| s.to_string());
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| EstimateError::InvalidInput(e.to_string()))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let region = region.ok_or_else(|| EstimateError::InvalidInput("missing region field".to_string()))?;
    let bytes = file_bytes.ok_or_else(|| EstimateError::InvalidInput("missing terraform field".to_string()))?;
    let is_zip = file_name.as_deref().map(|n| n.ends_with(".zip")).unwrap_or(false)
        || bytes.starts_with(b"PK\x03\x04");

    let config = if is_zip {
        let dir =
            hcl_loader::extract_zip_bytes(&bytes).map_err(|e| EstimateError::ConfigParseError(e.to_string()))?;
        hcl_loader::parse_hcl_dir(dir.path()).map_err(|e| EstimateError::ConfigParseError(e.to_string()))?
    } else {
        let source = String::from_utf8(bytes.clone())
            .map_err(|e| EstimateError::InvalidInput(format!("terraform file is not valid UTF-8: {e}")))?;
        hcl_loader::parse_hcl(&source).map_err(|e| EstimateError::ConfigParseError(e.to_string()))?
    };

    let estimate = run_estimate(&state, &config, &region, &bytes).await?;
    Ok(Json(estimate))
}

async fn run_estimate(
    state: &AppState,
    config: &domain_estimate::ParsedConfig,
    region: &str,
    input_bytes: &[u8],
) -> Result<CostEstimate, EstimateError> {
    let store = PgWarehouseStore::new(state.db.clone());
    price_against_store(&store, config, region, input_bytes).await
}

async fn price_against_store(
    store: &dyn WarehouseStore,
    config: &domain_estimate::ParsedConfig,
    region: &str,
    input_bytes: &[u8],
) -> Result<CostEstimate, EstimateError> {
    let registry = MatcherRegistry::with_defaults();

    let expanded = domain_estimate::expand(config);
    let vectors: Vec<_> = expanded
        .iter()
        .flat_map(|resource| registry.match_resource(resource, region))
        .collect();

    let mut services: Vec<String> = vectors.iter().map(|v| v.service.clone()).collect();
    services.sort();
    services.dedup();

    let catalog_version = catalog_version_tag(store, &services).await?;

    let priced_items = try_join_all(vectors.into_iter().map(|vector| match_price(store, vector))).await?;
    let priced_items = try_join_all(priced_items.into_iter().map(|item| apply_override(store, item))).await?;

    let estimate = aggregate(
        priced_items,
        input_bytes,
        catalog_version,
        chrono::Utc::now(),
        ENGINE_VERSION.to_string(),
    );

    let cost_cents = (estimate.total_monthly_cost * rust_decimal::Decimal::from(100))
        .round()
        .to_i64()
        .unwrap_or(0);
    observability::ResourceMetrics::set_estimated_monthly_cost("aws", cost_cents);

    Ok(estimate)
}

/// Tags an estimate with the catalog snapshot it was priced against: one
/// `service=version_hash` pair per distinct service touched, so a caller
/// can tell exactly which ingest produced the prices behind the number.
async fn catalog_version_tag(store: &dyn WarehouseStore, services: &[String]) -> Result<String, EstimateError> {
    if services.is_empty() {
        return Ok("none".to_string());
    }
    let mut parts = Vec::with_capacity(services.len());
    for service in services {
        let hash = store
            .latest_completed_version(service)
            .await?
            .map(|v| v.version_hash)
            .unwrap_or_else(|| "uningested".to_string());
        parts.push(format!("{service}={hash}"));
    }
    Ok(parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain_catalog::{CatalogStatus, CatalogVersion, MockWarehouseStore};
    use domain_estimate::ParsedConfig;
    use mockall::predicate::*;
    use uuid::Uuid;

    fn sample_config() -> ParsedConfig {
        hcl_loader::parse_hcl(
            r#"
            resource "aws_instance" "web" {
              instance_type = "t3.micro"
            }
            "#,
        )
        .unwrap()
    }

    fn ingested_version(service: &str, hash: &str) -> CatalogVersion {
        CatalogVersion {
            id: Uuid::now_v7(),
            service: service.to_string(),
            version_hash: hash.to_string(),
            source_url: "https://example.com".to_string(),
            etag: None,
            publication_date: Utc::now(),
            ingested_at: Utc::now(),
            record_count: 1,
            status: CatalogStatus::Completed,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn catalog_version_tag_is_none_for_an_empty_service_list() {
        let store = MockWarehouseStore::new();
        let tag = catalog_version_tag(&store, &[]).await.unwrap();
        assert_eq!(tag, "none");
    }

    #[tokio::test]
    async fn catalog_version_tag_joins_one_pair_per_service() {
        let mut store = MockWarehouseStore::new();
        store
            .expect_latest_completed_version()
            .with(eq("VMCompute"))
            .returning(|_| Ok(Some(ingested_version("VMCompute", "abc123"))));
        store
            .expect_latest_completed_version()
            .with(eq("ObjectStorage"))
            .returning(|_| Ok(None));

        let services = vec!["ObjectStorage".to_string(), "VMCompute".to_string()];
        let tag = catalog_version_tag(&store, &services).await.unwrap();

        assert_eq!(tag, "ObjectStorage=uningested,VMCompute=abc123");
    }

    #[tokio::test]
    async fn price_against_store_prices_every_vector_the_matcher_emits() {
        let mut store = MockWarehouseStore::new();
        store.expect_latest_completed_version().returning(|service| Ok(Some(ingested_version(service, "hash"))));
        store.expect_query_best_match().returning(|_| Ok(Vec::new()));
        store.expect_lookup_mapping().returning(|_, _| Ok(None));

        let config = sample_config();
        let estimate = price_against_store(&store, &config, "us-east-1", b"irrelevant").await.unwrap();

        // No rows in the (mocked, empty) warehouse means every vector the
        // vm matcher emits for one `aws_instance` comes back NOT_FOUND, but
        // the pipeline must still run end to end and account for all of them.
        assert!(!estimate.by_resource.is_empty());
        assert_eq!(estimate.total_monthly_cost, rust_decimal::Decimal::ZERO);
        assert!(estimate.by_resource.iter().all(|r| r.address == "aws_instance.web"));
    }
}
