use crate::error::CatalogResult;
use crate::models::{
    AttributeMapping, CatalogVersion, MatchCriteria, NewAttributeMapping, NewCatalogVersion,
    NewPricingDimension, PricingDimension, PricingOverride, CatalogStatus,
};
use async_trait::async_trait;
use uuid::Uuid;

/// The Warehouse Store (component A): durable storage for catalog
/// versions, their pricing dimensions, and the Rosetta attribute
/// mappings learned while ingesting them.
///
/// `bulk_insert_dimensions`/`bulk_insert_mappings` MUST use a native bulk
/// path — a single round trip regardless of batch size — never a
/// row-at-a-time insert loop.
#[async_trait]
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
pub trait WarehouseStore: Send + Sync {
    async fn upsert_catalog_version(&self, input: NewCatalogVersion) -> CatalogResult<CatalogVersion>;

    async fn update_status(
        &self,
        id: Uuid,
        status: CatalogStatus,
        record_count: Option<i64>,
        error_message: Option<String>,
    ) -> CatalogResult<()>;

    async fn catalog_version_exists(&self, service: &str, version_hash: &str) -> CatalogResult<bool>;

    async fn latest_completed_version(&self, service: &str) -> CatalogResult<Option<CatalogVersion>>;

    async fn bulk_insert_dimensions(&self, batch: Vec<NewPricingDimension>) -> CatalogResult<u64>;

    async fn bulk_insert_mappings(&self, batch: Vec<NewAttributeMapping>) -> CatalogResult<u64>;

    async fn query_best_match(&self, criteria: &MatchCriteria) -> CatalogResult<Vec<PricingDimension>>;

    async fn lookup_mapping(
        &self,
        mapping_type: crate::models::MappingType,
        source_value: &str,
    ) -> CatalogResult<Option<AttributeMapping>>;

    async fn prune_old_versions(&self, service: &str, keep_n: u64) -> CatalogResult<u64>;

    /// Unexpired overrides whose `service` matches exactly and whose
    /// `region_code`/`usage_type_pattern` are either unset (apply to
    /// everything) or match `region_code`/`usage_type`.
    async fn find_applicable_overrides(
        &self,
        service: &str,
        region_code: &str,
        usage_type: &str,
    ) -> CatalogResult<Vec<PricingOverride>>;
}
