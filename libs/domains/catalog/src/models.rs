use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a single `(service, version_hash)` catalog ingest.
///
/// Forward-only: `Pending -> Ingesting -> {Completed, Failed}`. Terminal
/// states never transition again; a crash mid-ingest leaves the row in
/// `Ingesting`, which a later run must detect and re-run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
    Default, DeriveActiveEnum, EnumIter, ToSchema, TS, Hash,
)]
#[ts(export)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "catalog_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CatalogStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "ingesting")]
    Ingesting,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Pricing term under which a `PricingDimension` row was published.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
    Default, DeriveActiveEnum, EnumIter, ToSchema, TS, Hash,
)]
#[ts(export)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "term_type")]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum TermType {
    #[default]
    #[sea_orm(string_value = "OnDemand")]
    OnDemand,
    #[sea_orm(string_value = "Reserved")]
    Reserved,
    #[sea_orm(string_value = "Spot")]
    Spot,
}

/// Kind of cross-reference table a Rosetta row belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
    Default, DeriveActiveEnum, EnumIter, ToSchema, TS, Hash,
)]
#[ts(export)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "mapping_type")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MappingType {
    #[default]
    #[sea_orm(string_value = "region_to_location")]
    RegionToLocation,
    #[sea_orm(string_value = "location_to_region")]
    LocationToRegion,
    #[sea_orm(string_value = "instance_family")]
    InstanceFamily,
    #[sea_orm(string_value = "operating_system")]
    OperatingSystem,
    #[sea_orm(string_value = "tenancy")]
    Tenancy,
    #[sea_orm(string_value = "license_model")]
    LicenseModel,
    #[sea_orm(string_value = "purchase_option")]
    PurchaseOption,
    #[sea_orm(string_value = "product_family")]
    ProductFamily,
    #[sea_orm(string_value = "usage_type_prefix")]
    UsageTypePrefix,
}

/// One `(service, version_hash)` ingest of a provider's price catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct CatalogVersion {
    #[ts(as = "String")]
    pub id: Uuid,
    pub service: String,
    pub version_hash: String,
    pub source_url: String,
    pub etag: Option<String>,
    #[ts(as = "String")]
    pub publication_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub ingested_at: DateTime<Utc>,
    pub record_count: i64,
    pub status: CatalogStatus,
    pub error_message: Option<String>,
}

/// Input to start tracking a new ingest. `version_hash` is computed by the
/// caller as `SHA-256(etag || source_url)`.
#[derive(Debug, Clone)]
pub struct NewCatalogVersion {
    pub service: String,
    pub version_hash: String,
    pub source_url: String,
    pub etag: Option<String>,
    pub publication_date: DateTime<Utc>,
}

/// Single normalized price row, owned exclusively by one `CatalogVersion`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PricingDimension {
    #[ts(as = "String")]
    pub id: Uuid,
    #[ts(as = "String")]
    pub catalog_version_id: Uuid,
    pub service: String,
    pub region_code: String,
    pub usage_type: String,
    pub operation: Option<String>,
    pub unit: String,
    #[ts(as = "String")]
    pub price_per_unit: Decimal,
    pub currency: String,
    pub begin_range: f64,
    pub end_range: Option<f64>,
    pub term_type: TermType,
    pub sku: String,
    pub rate_code: String,
    pub description: Option<String>,
    pub product_family: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// A single row to be loaded by `bulk_insert_dimensions`. Carries no `id` —
/// generated at insert time.
#[derive(Debug, Clone)]
pub struct NewPricingDimension {
    pub catalog_version_id: Uuid,
    pub service: String,
    pub region_code: String,
    pub usage_type: String,
    pub operation: Option<String>,
    pub unit: String,
    pub price_per_unit: Decimal,
    pub currency: String,
    pub begin_range: f64,
    pub end_range: Option<f64>,
    pub term_type: TermType,
    pub sku: String,
    pub rate_code: String,
    pub description: Option<String>,
    pub product_family: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// One learned Rosetta cross-reference row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct AttributeMapping {
    #[ts(as = "String")]
    pub id: Uuid,
    #[ts(as = "String")]
    pub catalog_version_id: Uuid,
    pub mapping_type: MappingType,
    pub source_value: String,
    pub target_value: String,
}

#[derive(Debug, Clone)]
pub struct NewAttributeMapping {
    pub catalog_version_id: Uuid,
    pub mapping_type: MappingType,
    pub source_value: String,
    pub target_value: String,
}

/// Optional hand-authored discount applied by the aggregator as a
/// post-match transform.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PricingOverride {
    #[ts(as = "String")]
    pub id: Uuid,
    pub service: String,
    pub region_code: Option<String>,
    pub usage_type_pattern: Option<String>,
    #[ts(as = "Option<String>")]
    pub override_price: Option<Decimal>,
    pub override_percentage: Option<f64>,
    pub reason: String,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Search criteria for `WarehouseStore::query_best_match`, shared by every
/// price-matcher strategy step.
#[derive(Debug, Clone, Default)]
pub struct MatchCriteria {
    pub service: String,
    pub region_code: String,
    pub usage_type: String,
    pub usage_type_pattern: bool,
    pub term_type: TermType,
    pub attributes: HashMap<String, String>,
}
